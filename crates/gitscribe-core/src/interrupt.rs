use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Wires Ctrl-C to the cooperative shutdown flag the flow polls.
///
/// The first signal only raises the flag: the flow finishes the git call
/// already in flight, restores the staging area, and exits with 130. A
/// second signal aborts the process immediately without restoration.
pub struct InterruptCoordinator;

impl InterruptCoordinator {
    pub fn install(flag: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
        ctrlc::set_handler(move || {
            if flag.load(Ordering::SeqCst) {
                eprintln!("\nAborting immediately; the staging area is left as-is.");
                std::process::exit(130);
            }
            flag.store(true, Ordering::SeqCst);
            eprintln!(
                "\nInterrupt received. Finishing the current operation and restoring the staging area... (Ctrl-C again to abort immediately)"
            );
        })
    }
}
