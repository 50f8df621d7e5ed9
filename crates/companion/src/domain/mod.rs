#![forbid(unsafe_code)]

mod round;
mod settings;
mod snapshot;

pub use round::{CodeEntry, RoundStats, RoundTypeStats};
pub use settings::Settings;
pub use snapshot::Snapshot;
