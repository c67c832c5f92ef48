use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for the commit flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    FlowStarted {
        working_dir: PathBuf,
        generator: String,
    },
    SnapshotCaptured {
        staged: usize,
    },
    AutoStageStarted {
        mode: String,
        candidates: usize,
    },
    AutoStageCompleted {
        staged: usize,
        duration_secs: f64,
    },
    AutoStageRolledBack {
        failed: usize,
        first_error: String,
    },
    StateCollected {
        staged: usize,
        unstaged: usize,
        binary: usize,
        truncated: usize,
    },
    GenerationStarted {
        generator: String,
    },
    GenerationCompleted {
        duration_secs: f64,
        subject: String,
    },
    CommitCreated {
        sha: String,
        files: usize,
    },
    RestorationStarted {
        paths: usize,
    },
    RestorationCompleted {
        restored: usize,
    },
    RestorationFailed {
        error: String,
    },
    Interrupted,
    ErrorEncountered {
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for gitscribe events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // Log to file if configured (always JSON format for file)
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        // Log to console based on format
        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::FlowStarted {
                working_dir,
                generator,
            } => {
                // Top banner
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "gitscribe".bold().bright_white(),
                    " ".repeat(58) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Dir:".dimmed(),
                    Self::truncate_with_padding(&working_dir.display().to_string(), 60, 64)
                        .dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Gen:".dimmed(),
                    Self::truncate_with_padding(generator, 60, 64).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::SnapshotCaptured { .. } => {
                // Debug info, skip in pretty mode
            }
            LogEvent::AutoStageStarted { mode, candidates } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "STAGE".bright_cyan().bold()
                );
                let _ = writeln!(
                    stderr,
                    "    {} {} candidate{} ({})",
                    "·".dimmed(),
                    candidates,
                    if *candidates == 1 { "" } else { "s" },
                    mode.dimmed()
                );
            }
            LogEvent::AutoStageCompleted {
                staged,
                duration_secs,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} Staged {} file{} ({:.1}s)",
                    "✓".bright_green(),
                    staged,
                    if *staged == 1 { "" } else { "s" },
                    duration_secs
                );
                let _ = writeln!(stderr);
            }
            LogEvent::AutoStageRolledBack {
                failed,
                first_error,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} {} file{} failed, rolled everything back",
                    "✗".bright_red(),
                    failed,
                    if *failed == 1 { "" } else { "s" }
                );
                let _ = writeln!(stderr, "      {}", first_error.bright_red());
                let _ = writeln!(stderr);
            }
            LogEvent::StateCollected {
                staged,
                unstaged,
                binary,
                truncated,
            } => {
                let mut extras = Vec::new();
                if *binary > 0 {
                    extras.push(format!("{} binary", binary));
                }
                if *truncated > 0 {
                    extras.push(format!("{} truncated", truncated));
                }
                let suffix = if extras.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", extras.join(", "))
                };
                let _ = writeln!(
                    stderr,
                    "    {} {} staged, {} unstaged{}",
                    "Files:".dimmed(),
                    staged,
                    unstaged,
                    suffix.dimmed()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::GenerationStarted { generator } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {}",
                    "▶".bright_magenta(),
                    "GENERATE".bright_magenta().bold(),
                    format!("({})", generator).dimmed()
                );
            }
            LogEvent::GenerationCompleted {
                duration_secs,
                subject,
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} Done ({:.1}s) {}",
                    "✓".bright_green(),
                    duration_secs,
                    subject.bright_white()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::CommitCreated { sha, files } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} {} ({} file{})",
                    "✓".bright_green(),
                    "Committed".bright_green().bold(),
                    sha.bright_yellow(),
                    files,
                    if *files == 1 { "" } else { "s" }
                );
            }
            LogEvent::RestorationStarted { paths } => {
                let _ = writeln!(
                    stderr,
                    "  {} {} ({} path{})",
                    "▶".bright_yellow(),
                    "RESTORE".bright_yellow().bold(),
                    paths,
                    if *paths == 1 { "" } else { "s" }
                );
            }
            LogEvent::RestorationCompleted { restored } => {
                let _ = writeln!(
                    stderr,
                    "    {} Staging area restored ({} path{})",
                    "✓".bright_green(),
                    restored,
                    if *restored == 1 { "" } else { "s" }
                );
            }
            LogEvent::RestorationFailed { error } => {
                let _ = writeln!(
                    stderr,
                    "    {} Restoration failed: {}",
                    "✗".bright_red(),
                    error.bright_red()
                );
            }
            LogEvent::Interrupted => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Interrupted, restoring staging area",
                    "⚠".bright_yellow()
                );
            }
            LogEvent::ErrorEncountered { error } => {
                let _ = writeln!(stderr);
                let _ = writeln!(stderr, "{} {}", "✗".bright_red(), error.bright_red());
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::FlowStarted { generator, .. } => {
                format!("[{}] flow:start gen={}", timestamp, generator)
            }
            LogEvent::SnapshotCaptured { staged } => {
                format!("[{}] snapshot:{}", timestamp, staged)
            }
            LogEvent::AutoStageStarted { mode, candidates } => {
                format!("[{}] stage:start:{} mode={}", timestamp, candidates, mode)
            }
            LogEvent::AutoStageCompleted {
                staged,
                duration_secs,
            } => format!("[{}] stage:done:{} {:.1}s", timestamp, staged, duration_secs),
            LogEvent::AutoStageRolledBack { failed, .. } => {
                format!("[{}] stage:rollback failed={}", timestamp, failed)
            }
            LogEvent::StateCollected {
                staged,
                unstaged,
                binary,
                truncated,
            } => format!(
                "[{}] state:{}+{} bin={} cap={}",
                timestamp, staged, unstaged, binary, truncated
            ),
            LogEvent::GenerationStarted { generator } => {
                format!("[{}] gen:start:{}", timestamp, generator)
            }
            LogEvent::GenerationCompleted { duration_secs, .. } => {
                format!("[{}] gen:done {:.1}s", timestamp, duration_secs)
            }
            LogEvent::CommitCreated { sha, files } => {
                format!("[{}] commit:{} files={}", timestamp, sha, files)
            }
            LogEvent::RestorationStarted { paths } => {
                format!("[{}] restore:start:{}", timestamp, paths)
            }
            LogEvent::RestorationCompleted { restored } => {
                format!("[{}] restore:done:{}", timestamp, restored)
            }
            LogEvent::RestorationFailed { error } => {
                format!("[{}] restore:failed {}", timestamp, error)
            }
            LogEvent::Interrupted => format!("[{}] interrupted", timestamp),
            LogEvent::ErrorEncountered { error } => {
                format!("[{}] error:{}", timestamp, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let truncated = if s.len() > max_len {
            let mut cut = max_len - 3;
            while !s.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &s[..cut])
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1); // +1 for trailing │
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
