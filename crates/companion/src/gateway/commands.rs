#![forbid(unsafe_code)]

use super::DirectoryPicker;
use crate::backend::{GET_STATE, SET_LOG_DIR, Transport};
use crate::domain::{Settings, Snapshot};
use crate::error::Error;
use crate::stores::SnapshotStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Request/response commands whose results are folded into the store.
#[derive(Clone)]
pub struct CommandGateway {
    transport: Arc<dyn Transport>,
    store: SnapshotStore,
}

impl CommandGateway {
    pub fn new(transport: Arc<dyn Transport>, store: SnapshotStore) -> Self {
        Self { transport, store }
    }

    /// Fetch the full backend state and replace the store with it.
    pub async fn fetch_state(&self) -> Result<Snapshot, Error> {
        let value = self.transport.invoke(GET_STATE, Value::Null).await?;
        let snapshot: Snapshot =
            serde_json::from_value(value).map_err(|err| Error::invalid_response(GET_STATE, err))?;
        self.store.replace_full(snapshot.clone());
        debug!(history = snapshot.history.len(), "initial state fetched");
        Ok(snapshot)
    }

    /// Ask the backend to use `log_dir` (`None` restores the default).
    ///
    /// The backend validates the directory. The store only changes when the
    /// whole command succeeds.
    pub async fn set_log_dir(&self, log_dir: Option<String>) -> Result<Settings, Error> {
        let log_dir = Settings::new(log_dir).log_dir().map(str::to_owned);
        let issued_at = self.store.revision();

        let value = self
            .transport
            .invoke(SET_LOG_DIR, json!({ "logDir": log_dir }))
            .await?;
        let settings: Settings = serde_json::from_value(value)
            .map_err(|err| Error::invalid_response(SET_LOG_DIR, err))?;

        if self.store.revision() != issued_at {
            debug!("state changed while set_log_dir was in flight; applying its settings");
        }
        self.store.replace_settings(settings.clone());
        info!(log_dir = ?settings.log_dir(), "log directory updated");
        Ok(settings)
    }

    pub async fn reset_log_dir(&self) -> Result<Settings, Error> {
        self.set_log_dir(None).await
    }

    /// Let the user pick a directory, then send it. A cancelled picker sends
    /// nothing and returns `Ok(None)`.
    pub async fn choose_log_dir(
        &self,
        picker: &dyn DirectoryPicker,
    ) -> Result<Option<Settings>, Error> {
        let picked = match picker.pick_directory().await {
            Ok(Some(dir)) => dir,
            Ok(None) | Err(Error::UserCancelled) => {
                debug!("directory picker cancelled");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        self.set_log_dir(Some(picked)).await.map(Some)
    }
}
