mod confirm;
mod filesystem;
mod orchestrator;
mod state;

pub use confirm::{prompt_for, Confirmation, LineConfirmation, TerminalConfirmation};
pub use filesystem::{HomeDirectoryStore, LocalFilesystem};
pub use orchestrator::{CandidateDecision, DeprovisionOutcome, Deprovisioner};
pub use state::{DeprovisionMachine, DeprovisionState, TransitionError};
