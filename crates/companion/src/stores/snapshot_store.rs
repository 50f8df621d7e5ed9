#![forbid(unsafe_code)]

use crate::domain::{Settings, Snapshot};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Applied,
    /// Dropped because `seq` was not newer than the last applied sequence.
    Stale { seq: u64, last: u64 },
}

#[derive(Debug, Default)]
struct StoreState {
    snapshot: Snapshot,
    last_seq: Option<u64>,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<StoreState>,
    revision: watch::Sender<u64>,
    drop_stale: bool,
}

/// The single UI-facing copy of backend state.
///
/// Every mutation is one critical section under the write lock and bumps the
/// revision counter observed through [`SnapshotStore::subscribe`].
#[derive(Debug, Clone)]
pub struct SnapshotStore(Arc<Shared>);

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SnapshotStore {
    pub fn new(drop_stale: bool) -> Self {
        let (revision, _) = watch::channel(0);
        Self(Arc::new(Shared {
            state: RwLock::new(StoreState::default()),
            revision,
            drop_stale,
        }))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.0.state.read().snapshot.clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        f(&self.0.state.read().snapshot)
    }

    pub fn settings(&self) -> Settings {
        self.read(|snapshot| snapshot.settings.clone())
    }

    /// Number of mutations applied so far.
    pub fn revision(&self) -> u64 {
        *self.0.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.0.revision.subscribe()
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.0.state.read().last_seq
    }

    pub fn replace_full(&self, snapshot: Snapshot) {
        let mut state = self.0.state.write();
        state.snapshot = snapshot;
        self.bump();
        trace!(history = state.snapshot.history.len(), "snapshot replaced");
    }

    pub fn replace_settings(&self, settings: Settings) {
        let mut state = self.0.state.write();
        state.snapshot.settings = settings;
        self.bump();
        trace!(settings = ?state.snapshot.settings, "settings replaced");
    }

    /// Apply a pushed snapshot. Unsequenced payloads always win.
    pub fn apply_push(&self, seq: Option<u64>, snapshot: Snapshot) -> PushOutcome {
        let mut state = self.0.state.write();
        if let (Some(seq), Some(last)) = (seq, state.last_seq)
            && self.0.drop_stale
            && seq <= last
        {
            debug!(seq, last, "dropping stale state push");
            return PushOutcome::Stale { seq, last };
        }
        state.snapshot = snapshot;
        if let Some(seq) = seq {
            state.last_seq = Some(state.last_seq.map_or(seq, |last| last.max(seq)));
        }
        self.bump();
        PushOutcome::Applied
    }

    fn bump(&self) {
        self.0.revision.send_modify(|revision| *revision += 1);
    }
}
