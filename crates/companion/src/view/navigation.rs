#![forbid(unsafe_code)]

use config::View;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Active page of the window.
#[derive(Debug, Clone)]
pub struct Navigation {
    current: Arc<watch::Sender<View>>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new(View::default())
    }
}

impl Navigation {
    pub fn new(initial: View) -> Self {
        let (current, _) = watch::channel(initial);
        Self {
            current: Arc::new(current),
        }
    }

    pub fn current(&self) -> View {
        *self.current.borrow()
    }

    pub fn navigate(&self, view: View) {
        let changed = self.current.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
        if changed {
            debug!(%view, "navigated");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.current.subscribe()
    }
}
