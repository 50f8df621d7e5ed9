#![forbid(unsafe_code)]

mod error;
mod events;
mod ui;
mod updater;
mod view;

pub use error::Error;
pub use events::Events;
pub use ui::{DEFAULT_LOG_DIR, Ui};
pub use updater::Updater;
pub use view::View;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables with this prefix override file values, e.g.
/// `ROUNDWATCH_UPDATER__CHECK_ON_STARTUP=false`.
pub const ENV_PREFIX: &str = "ROUNDWATCH_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub events: Events,
    pub updater: Updater,
    pub ui: Ui,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults, then the TOML file at `path`, then environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let config = Self::figment()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load defaults with environment overrides only.
    pub fn from_env() -> Result<Self, Error> {
        let config = Self::figment()
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let doc = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, doc)?;
        Ok(())
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }
}
