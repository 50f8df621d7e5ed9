#![forbid(unsafe_code)]

use crate::error::Error;
use async_trait::async_trait;

/// Native directory chooser.
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    /// `Ok(None)` or `Err(Error::UserCancelled)` when the user backs out.
    async fn pick_directory(&self) -> Result<Option<String>, Error>;
}
