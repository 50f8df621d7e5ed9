#![forbid(unsafe_code)]

use crate::update::{UpdateOrchestrator, UpdateState, UpdateStatus};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct Surfaces {
    modal_open: bool,
    /// Version whose banner the user closed.
    banner_dismissed_for: Option<String>,
}

/// Update modal and notification banner.
///
/// Both surfaces render the one [`UpdateOrchestrator`] state; only their
/// visibility is tracked here.
#[derive(Debug)]
pub struct UpdatePresentation {
    updater: UpdateOrchestrator,
    surfaces: Mutex<Surfaces>,
}

impl UpdatePresentation {
    pub fn new(updater: UpdateOrchestrator) -> Self {
        Self {
            updater,
            surfaces: Mutex::new(Surfaces::default()),
        }
    }

    pub fn updater(&self) -> &UpdateOrchestrator {
        &self.updater
    }

    pub fn is_modal_open(&self) -> bool {
        self.surfaces.lock().modal_open
    }

    /// Open the modal. From `idle` or `up-to-date` a fresh check is spawned
    /// on the current tokio runtime and its handle returned.
    pub fn open_modal(&self) -> Option<JoinHandle<UpdateState>> {
        self.surfaces.lock().modal_open = true;
        match self.updater.status() {
            UpdateStatus::Idle | UpdateStatus::UpToDate => {
                let updater = self.updater.clone();
                Some(tokio::spawn(async move { updater.check_for_updates().await }))
            }
            _ => None,
        }
    }

    /// Open the modal from the banner's update action, without a new check.
    pub fn open_modal_from_banner(&self) {
        self.surfaces.lock().modal_open = true;
    }

    /// Close the modal. Terminal states are dismissed; anything in flight
    /// keeps running with the banner as the remaining surface.
    pub fn close_modal(&self) {
        self.surfaces.lock().modal_open = false;
        if self.updater.state().is_terminal() {
            self.updater.dismiss();
        } else {
            debug!(state = %self.updater.status(), "modal closed, update keeps running");
        }
    }

    pub fn banner_visible(&self) -> bool {
        let surfaces = self.surfaces.lock();
        if surfaces.modal_open {
            return false;
        }
        match self.updater.state() {
            UpdateState::Available(info) => {
                surfaces.banner_dismissed_for.as_deref() != Some(info.version.as_str())
            }
            _ => false,
        }
    }

    /// Hide the banner for the currently offered version.
    pub fn dismiss_banner(&self) {
        if let UpdateState::Available(info) = self.updater.state() {
            debug!(version = %info.version, "banner dismissed");
            self.surfaces.lock().banner_dismissed_for = Some(info.version);
        }
    }
}
