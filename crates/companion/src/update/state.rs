#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Release description, surfaced to the UI as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl UpdateInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            current_version: None,
            notes: None,
            date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub bytes_downloaded: u64,
    #[serde(default)]
    pub bytes_total: Option<u64>,
}

impl Progress {
    pub fn new(bytes_downloaded: u64, bytes_total: Option<u64>) -> Self {
        Self {
            bytes_downloaded,
            bytes_total,
        }
    }

    /// Completed fraction in `0.0..=1.0`, when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.bytes_total {
            Some(0) | None => None,
            Some(total) => Some((self.bytes_downloaded as f64 / total as f64).min(1.0)),
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes_total {
            Some(total) => write!(f, "{}/{}", self.bytes_downloaded, total),
            None => write!(f, "{}/?", self.bytes_downloaded),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateState {
    #[default]
    Idle,
    Checking,
    Available(UpdateInfo),
    Downloading {
        info: UpdateInfo,
        progress: Progress,
    },
    ReadyToInstall(UpdateInfo),
    UpToDate,
    Error(String),
}

/// Payload-free discriminant of [`UpdateState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    Idle,
    Checking,
    Available,
    Downloading,
    ReadyToInstall,
    UpToDate,
    Error,
}

impl UpdateState {
    pub fn status(&self) -> UpdateStatus {
        match self {
            UpdateState::Idle => UpdateStatus::Idle,
            UpdateState::Checking => UpdateStatus::Checking,
            UpdateState::Available(_) => UpdateStatus::Available,
            UpdateState::Downloading { .. } => UpdateStatus::Downloading,
            UpdateState::ReadyToInstall(_) => UpdateStatus::ReadyToInstall,
            UpdateState::UpToDate => UpdateStatus::UpToDate,
            UpdateState::Error(_) => UpdateStatus::Error,
        }
    }

    pub fn info(&self) -> Option<&UpdateInfo> {
        match self {
            UpdateState::Available(info)
            | UpdateState::Downloading { info, .. }
            | UpdateState::ReadyToInstall(info) => Some(info),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<Progress> {
        match self {
            UpdateState::Downloading { progress, .. } => Some(*progress),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UpdateState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// States left only through [`dismiss`](super::UpdateOrchestrator::dismiss).
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdateState::UpToDate | UpdateState::Error(_))
    }
}

impl UpdateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateStatus::Idle => "idle",
            UpdateStatus::Checking => "checking",
            UpdateStatus::Available => "available",
            UpdateStatus::Downloading => "downloading",
            UpdateStatus::ReadyToInstall => "ready-to-install",
            UpdateStatus::UpToDate => "up-to-date",
            UpdateStatus::Error => "error",
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateState::Available(info) | UpdateState::ReadyToInstall(info) => {
                write!(f, "{}({})", self.status(), info.version)
            }
            UpdateState::Downloading { progress, .. } => write!(f, "downloading({progress})"),
            UpdateState::Error(message) => write!(f, "error({message})"),
            _ => f.write_str(self.status().as_str()),
        }
    }
}
