#![forbid(unsafe_code)]

mod memory;
mod names;
mod transport;

pub use memory::{InMemoryBackend, Release};
pub use names::{
    CHECK_UPDATE, DOWNLOAD_AND_INSTALL_UPDATE, GET_STATE, OPEN_SETTINGS, SET_LOG_DIR,
    STATE_UPDATED, UPDATE_PROGRESS,
};
pub use transport::{EventStream, ListenerId, Transport};
