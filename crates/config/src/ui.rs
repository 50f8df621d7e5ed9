#![forbid(unsafe_code)]

use crate::view::View;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_DIR: &str = "%LOCALAPPDATA%Low\\VRChat\\VRChat";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Ui {
    /// View shown before any navigation happens.
    pub initial_view: View,

    /// Directory shown to the user while no log directory is configured.
    pub default_log_dir: String,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            initial_view: View::Home,
            default_log_dir: DEFAULT_LOG_DIR.to_owned(),
        }
    }
}
