#![forbid(unsafe_code)]

pub mod backend;
pub mod context;
pub mod domain;
mod error;
pub mod gateway;
pub mod stores;
pub mod subscription;
pub mod update;
pub mod view;

pub use backend::{InMemoryBackend, Transport};
pub use context::{AppContext, Services};
pub use error::Error;
pub use stores::SnapshotStore;
pub use update::{UpdateOrchestrator, UpdateState};
