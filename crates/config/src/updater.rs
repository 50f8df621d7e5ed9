#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Updater {
    /// Run one update check right after startup.
    pub check_on_startup: bool,

    /// Version used for comparison when the backend does not report one.
    pub current_version: Option<String>,
}

impl Default for Updater {
    fn default() -> Self {
        Self {
            check_on_startup: true,
            current_version: None,
        }
    }
}
