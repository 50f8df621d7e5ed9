#![forbid(unsafe_code)]

mod snapshot_store;

pub use snapshot_store::{PushOutcome, SnapshotStore};
