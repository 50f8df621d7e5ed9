#![forbid(unsafe_code)]

use crate::backend::{ListenerId, Transport};
use crate::error::Error;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::debug;

/// One live `listen` registration and the task draining it.
///
/// Released exactly once: by [`Subscription::release`] or on drop,
/// whichever comes first.
pub struct Subscription {
    event: String,
    listener: ListenerId,
    transport: Arc<dyn Transport>,
    task: JoinHandle<()>,
    released: AtomicBool,
}

impl Subscription {
    /// Listen for `event` and run `handler` for each payload, in delivery
    /// order, on a task of the current runtime.
    pub fn spawn<F>(transport: Arc<dyn Transport>, event: &str, mut handler: F) -> Result<Self, Error>
    where
        F: FnMut(Value) + Send + 'static,
    {
        let stream = transport.listen(event)?;
        let listener = stream.id();
        let task = tokio::spawn(async move {
            while let Some(payload) = stream.recv().await {
                handler(payload);
            }
            debug!(event = stream.event(), "event stream closed");
        });
        debug!(event, listener, "subscribed");
        Ok(Self {
            event: event.to_owned(),
            listener,
            transport,
            task,
            released: AtomicBool::new(false),
        })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Unlisten and stop the task. Returns `false` if already released.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.transport.unlisten(self.listener);
        self.task.abort();
        debug!(event = %self.event, listener = self.listener, "unsubscribed");
        true
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("listener", &self.listener)
            .field("released", &self.is_released())
            .finish()
    }
}
