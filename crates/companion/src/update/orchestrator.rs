#![forbid(unsafe_code)]

use super::{CheckOutcome, Progress, UpdateInfo, UpdateSource, UpdateState, UpdateStatus};
use crate::error::Error;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

struct Inner {
    source: Arc<dyn UpdateSource>,
    state: watch::Sender<UpdateState>,
}

/// Self-update state machine.
///
/// The `watch` channel is the only copy of [`UpdateState`]. Each transition
/// is one conditional modification of that channel, so a transition either
/// happens atomically or not at all even when several tasks race.
#[derive(Clone)]
pub struct UpdateOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for UpdateOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateOrchestrator")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl UpdateOrchestrator {
    pub fn new(source: Arc<dyn UpdateSource>) -> Self {
        let (state, _) = watch::channel(UpdateState::Idle);
        Self {
            inner: Arc::new(Inner { source, state }),
        }
    }

    pub fn state(&self) -> UpdateState {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> UpdateStatus {
        self.inner.state.borrow().status()
    }

    /// Receiver notified on every transition and progress update.
    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.inner.state.subscribe()
    }

    /// Ask the source for a newer release and return the resulting state.
    ///
    /// Does nothing while a check or download is in flight, or once a release
    /// is ready to install.
    pub async fn check_for_updates(&self) -> UpdateState {
        let started = self.inner.state.send_if_modified(|state| match state {
            UpdateState::Checking
            | UpdateState::Downloading { .. }
            | UpdateState::ReadyToInstall(_) => false,
            _ => {
                *state = UpdateState::Checking;
                true
            }
        });
        if !started {
            debug!(state = %self.status(), "update check skipped");
            return self.state();
        }

        debug!("checking for updates");
        let next = match self.inner.source.check().await {
            Ok(CheckOutcome::Available(info)) => {
                info!(version = %info.version, "update available");
                UpdateState::Available(info)
            }
            Ok(CheckOutcome::UpToDate) => {
                debug!("already up to date");
                UpdateState::UpToDate
            }
            Err(err) => {
                let err = match err {
                    Error::UpdateCheckFailed(_) => err,
                    other => Error::UpdateCheckFailed(other.to_string()),
                };
                warn!(%err, "update check failed");
                UpdateState::Error(err.to_string())
            }
        };
        self.inner.state.send_replace(next.clone());
        next
    }

    /// Download and install the release offered in `available`, returning the
    /// resulting state. Any other starting state makes this a no-op.
    pub async fn download_and_install(&self) -> UpdateState {
        let mut claimed: Option<UpdateInfo> = None;
        self.inner.state.send_if_modified(|state| {
            let UpdateState::Available(info) = state else {
                return false;
            };
            let info = info.clone();
            claimed = Some(info.clone());
            *state = UpdateState::Downloading {
                info,
                progress: Progress::default(),
            };
            true
        });
        let Some(info) = claimed else {
            debug!(state = %self.status(), "download skipped");
            return self.state();
        };

        info!(version = %info.version, "downloading update");
        let on_progress = |update: Progress| self.record_progress(update);
        let next = match self
            .inner
            .source
            .download_and_install(&info, &on_progress)
            .await
        {
            Ok(()) => {
                info!(version = %info.version, "update ready to install");
                UpdateState::ReadyToInstall(info)
            }
            Err(err) => {
                let err = match err {
                    Error::UpdateDownloadFailed(_) => err,
                    other => Error::UpdateDownloadFailed(other.to_string()),
                };
                warn!(%err, "update download failed");
                UpdateState::Error(err.to_string())
            }
        };
        self.inner.state.send_replace(next.clone());
        next
    }

    /// Reset `up-to-date` or `error` to `idle`. Returns whether it did.
    pub fn dismiss(&self) -> bool {
        let dismissed = self.inner.state.send_if_modified(|state| {
            if state.is_terminal() {
                *state = UpdateState::Idle;
                true
            } else {
                false
            }
        });
        if !dismissed {
            debug!(state = %self.status(), "dismiss ignored");
        }
        dismissed
    }

    fn record_progress(&self, update: Progress) {
        self.inner.state.send_if_modified(|state| {
            let UpdateState::Downloading { progress, .. } = state else {
                return false;
            };
            if update.bytes_downloaded < progress.bytes_downloaded {
                debug!(%update, current = %progress, "ignoring regressing progress");
                return false;
            }
            *progress = Progress {
                bytes_downloaded: update.bytes_downloaded,
                bytes_total: update.bytes_total.or(progress.bytes_total),
            };
            true
        });
    }
}
