#![forbid(unsafe_code)]

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend rejected `{command}`: {reason}")]
    CommandRejected { command: String, reason: String },

    #[error("invalid response to `{command}`: {source}")]
    InvalidResponse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("update check failed: {0}")]
    UpdateCheckFailed(String),

    #[error("update download failed: {0}")]
    UpdateDownloadFailed(String),

    #[error("cancelled by user")]
    UserCancelled,
}

impl Error {
    pub(crate) fn invalid_response(command: &str, source: serde_json::Error) -> Self {
        Self::InvalidResponse {
            command: command.to_owned(),
            source,
        }
    }
}
