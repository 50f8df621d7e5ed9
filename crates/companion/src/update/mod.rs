#![forbid(unsafe_code)]

mod orchestrator;
mod source;
mod state;

pub use orchestrator::UpdateOrchestrator;
pub use source::{CheckOutcome, TransportUpdateSource, UpdateManifest, UpdateSource};
pub use state::{Progress, UpdateInfo, UpdateState, UpdateStatus};
