#![forbid(unsafe_code)]

use crate::error::Error;
use async_trait::async_trait;
use serde_json::Value;

pub type ListenerId = u64;

/// Receiving half of one `listen` registration.
#[derive(Debug)]
pub struct EventStream {
    id: ListenerId,
    event: String,
    receiver: flume::Receiver<Value>,
}

impl EventStream {
    pub fn new(id: ListenerId, event: impl Into<String>, receiver: flume::Receiver<Value>) -> Self {
        Self {
            id,
            event: event.into(),
            receiver,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Next payload, or `None` once the backend dropped the sender.
    pub async fn recv(&self) -> Option<Value> {
        self.receiver.recv_async().await.ok()
    }

    pub fn try_recv(&self) -> Option<Value> {
        self.receiver.try_recv().ok()
    }
}

/// Generic request/response and push-event channel to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one command and wait for its own response.
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, Error>;

    /// Register for pushes of `event`.
    fn listen(&self, event: &str) -> Result<EventStream, Error>;

    /// Drop a registration. Unknown ids are ignored.
    fn unlisten(&self, id: ListenerId);
}
