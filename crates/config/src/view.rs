#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level page of the companion window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Home,
    History,
    Settings,
    About,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Home => "home",
            View::History => "history",
            View::Settings => "settings",
            View::About => "about",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
