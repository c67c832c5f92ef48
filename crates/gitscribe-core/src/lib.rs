mod error;
mod flow;
mod interrupt;
mod outcome;

pub use error::FlowError;
pub use flow::{AcceptAll, CommitFlow, Confirmer, FlowOptions, ReviewDecision};
pub use interrupt::InterruptCoordinator;
pub use outcome::FlowOutcome;
