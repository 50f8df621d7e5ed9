#![forbid(unsafe_code)]

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// `None` selects the built-in default directory. Never `Some("")`.
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    log_dir: Option<String>,
}

impl Settings {
    pub fn new(log_dir: Option<String>) -> Self {
        Self {
            log_dir: log_dir.filter(|dir| !dir.trim().is_empty()),
        }
    }

    pub fn log_dir(&self) -> Option<&str> {
        self.log_dir.as_deref()
    }

    pub fn is_using_default(&self) -> bool {
        self.log_dir.is_none()
    }

    /// Directory to show the user, falling back to `default`.
    pub fn display_log_dir<'a>(&'a self, default: &'a str) -> &'a str {
        self.log_dir.as_deref().unwrap_or(default)
    }
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|dir| !dir.trim().is_empty()))
}
