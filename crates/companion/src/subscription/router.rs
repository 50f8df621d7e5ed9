#![forbid(unsafe_code)]

use super::Subscription;
use crate::backend::{OPEN_SETTINGS, STATE_UPDATED, Transport};
use crate::domain::Snapshot;
use crate::error::Error;
use crate::stores::{PushOutcome, SnapshotStore};
use crate::view::{Navigation, View};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace, warn};

/// `state_updated` payload: a full snapshot with an optional sequence number.
#[derive(Debug, Deserialize)]
struct StatePush {
    #[serde(default)]
    seq: Option<u64>,
    #[serde(flatten)]
    snapshot: Snapshot,
}

/// The two long-lived backend subscriptions.
#[derive(Debug)]
pub struct EventSubscription {
    state: Subscription,
    navigation: Subscription,
}

impl EventSubscription {
    /// Subscribe to state pushes and settings-navigation requests.
    ///
    /// If the second registration fails the first one is released before
    /// the error is returned.
    pub fn establish(
        transport: Arc<dyn Transport>,
        store: SnapshotStore,
        navigation: Navigation,
    ) -> Result<Self, Error> {
        let state = Subscription::spawn(Arc::clone(&transport), STATE_UPDATED, move |payload| {
            apply_state_push(&store, payload)
        })?;
        let navigation = Subscription::spawn(transport, OPEN_SETTINGS, move |_| {
            navigation.navigate(View::Settings)
        })?;
        Ok(Self { state, navigation })
    }

    pub fn release(&self) {
        self.state.release();
        self.navigation.release();
    }

    pub fn is_released(&self) -> bool {
        self.state.is_released() && self.navigation.is_released()
    }
}

fn apply_state_push(store: &SnapshotStore, payload: Value) {
    let push: StatePush = match serde_json::from_value(payload) {
        Ok(push) => push,
        Err(err) => {
            warn!(%err, "dropping malformed state_updated payload");
            return;
        }
    };
    match store.apply_push(push.seq, push.snapshot) {
        PushOutcome::Applied => trace!(seq = ?push.seq, "state push applied"),
        PushOutcome::Stale { seq, last } => warn!(seq, last, "out-of-order state push dropped"),
    }
}
