#![forbid(unsafe_code)]

use crate::error::Error;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// OS launch-at-login registration.
#[async_trait]
pub trait Autostart: Send + Sync {
    async fn is_enabled(&self) -> Result<bool, Error>;
    async fn enable(&self) -> Result<(), Error>;
    async fn disable(&self) -> Result<(), Error>;
}

/// Cached autostart flag shown in the settings view.
pub struct AutostartToggle {
    backend: Arc<dyn Autostart>,
    enabled: AtomicBool,
}

impl AutostartToggle {
    pub fn new(backend: Arc<dyn Autostart>) -> Self {
        Self {
            backend,
            enabled: AtomicBool::new(false),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Re-read the registration state.
    pub async fn refresh(&self) -> Result<bool, Error> {
        let enabled = self.backend.is_enabled().await?;
        self.enabled.store(enabled, Ordering::Release);
        Ok(enabled)
    }

    /// Flip the registration. The cached flag changes only on success.
    pub async fn toggle(&self) -> Result<bool, Error> {
        let enable = !self.enabled();
        if enable {
            self.backend.enable().await?;
        } else {
            self.backend.disable().await?;
        }
        self.enabled.store(enable, Ordering::Release);
        info!(enabled = enable, "autostart toggled");
        Ok(enable)
    }
}
