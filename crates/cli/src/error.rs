use crate::signals::SignalEvent;
use flume::SendError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("Failed to send signal event: {0}")]
    SendSignal(#[from] SendError<SignalEvent>),

    #[error("Failed to read snapshot {path:?}: {source}")]
    ReadSnapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid snapshot {path:?}: {source}")]
    ParseSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
