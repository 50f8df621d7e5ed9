#![forbid(unsafe_code)]

use super::{Progress, UpdateInfo};
use crate::backend::{CHECK_UPDATE, DOWNLOAD_AND_INSTALL_UPDATE, Transport, UPDATE_PROGRESS};
use crate::error::Error;
use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Available(UpdateInfo),
    UpToDate,
}

/// Where releases come from and how they get installed.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn check(&self) -> Result<CheckOutcome, Error>;

    /// Download `info` and hand it to the installer, reporting cumulative
    /// progress through `on_progress`.
    async fn download_and_install(
        &self,
        info: &UpdateInfo,
        on_progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<(), Error>;
}

/// Response body of `check_update`; `null` means no release is offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    pub version: String,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl UpdateManifest {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            current_version: None,
            body: None,
            date: None,
        }
    }
}

/// [`UpdateSource`] speaking the backend's updater commands over a
/// [`Transport`].
pub struct TransportUpdateSource {
    transport: Arc<dyn Transport>,
    current_version: Option<String>,
}

impl TransportUpdateSource {
    /// `current_version` is used when the backend omits `currentVersion`.
    pub fn new(transport: Arc<dyn Transport>, current_version: Option<String>) -> Self {
        Self {
            transport,
            current_version,
        }
    }

    fn outcome(&self, manifest: UpdateManifest) -> Result<CheckOutcome, Error> {
        let offered = Version::parse(manifest.version.trim()).map_err(|err| {
            Error::UpdateCheckFailed(format!("invalid version `{}`: {err}", manifest.version))
        })?;

        let current_version = manifest
            .current_version
            .or_else(|| self.current_version.clone());
        if let Some(current) = &current_version {
            match Version::parse(current.trim()) {
                Ok(current) if offered <= current => {
                    debug!(%offered, %current, "offered release is not newer");
                    return Ok(CheckOutcome::UpToDate);
                }
                Ok(_) => {}
                Err(err) => warn!(%err, current, "ignoring unparsable current version"),
            }
        }

        Ok(CheckOutcome::Available(UpdateInfo {
            version: manifest.version,
            current_version,
            notes: manifest.body,
            date: manifest.date,
        }))
    }
}

struct Unlisten<'a> {
    transport: &'a dyn Transport,
    id: crate::backend::ListenerId,
}

impl Drop for Unlisten<'_> {
    fn drop(&mut self) {
        self.transport.unlisten(self.id);
    }
}

fn forward_progress(payload: Value, on_progress: &(dyn Fn(Progress) + Send + Sync)) {
    match serde_json::from_value::<Progress>(payload) {
        Ok(progress) => on_progress(progress),
        Err(err) => warn!(%err, "dropping malformed update_progress payload"),
    }
}

#[async_trait]
impl UpdateSource for TransportUpdateSource {
    async fn check(&self) -> Result<CheckOutcome, Error> {
        let value = self.transport.invoke(CHECK_UPDATE, Value::Null).await?;
        let manifest: Option<UpdateManifest> = serde_json::from_value(value)
            .map_err(|err| Error::invalid_response(CHECK_UPDATE, err))?;
        match manifest {
            Some(manifest) => self.outcome(manifest),
            None => Ok(CheckOutcome::UpToDate),
        }
    }

    async fn download_and_install(
        &self,
        info: &UpdateInfo,
        on_progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<(), Error> {
        let stream = self.transport.listen(UPDATE_PROGRESS)?;
        let _unlisten = Unlisten {
            transport: self.transport.as_ref(),
            id: stream.id(),
        };

        let invoke = self.transport.invoke(
            DOWNLOAD_AND_INSTALL_UPDATE,
            json!({ "version": info.version }),
        );
        tokio::pin!(invoke);

        let mut open = true;
        let result = loop {
            tokio::select! {
                biased;
                payload = stream.recv(), if open => match payload {
                    Some(payload) => forward_progress(payload, on_progress),
                    None => open = false,
                },
                result = &mut invoke => break result,
            }
        };

        while let Some(payload) = stream.try_recv() {
            forward_progress(payload, on_progress);
        }

        result.map(|_| ())
    }
}
