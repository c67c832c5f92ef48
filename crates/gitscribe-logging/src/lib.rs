//! Structured logging for the gitscribe commit flow.
//!
//! [`Logger`] emits one [`LogEvent`] per flow milestone (staging, generation,
//! commit, restoration) in the configured [`LogFormat`], optionally mirrored
//! to a JSON-lines file. [`init_tracing`] wires up the `tracing` diagnostics
//! that the git runner and generator spawner emit underneath those events.
//!
//! Everything here writes to stderr; stdout is reserved for the tool's own
//! output (proposed messages, JSON outcomes).

mod events;

pub use events::{LogEvent, LogFormat, Logger};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the application
pub fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty | LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .init();
        }
    }
}
