#![forbid(unsafe_code)]

use super::{CodeEntry, RoundStats, Settings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Point-in-time view of backend-owned state.
///
/// `latest_entry` shares its allocation with the last element of `history`
/// whenever the two describe the same record, so the UI never holds two
/// diverging copies of one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotRepr")]
pub struct Snapshot {
    pub settings: Settings,
    pub history: Vec<Arc<CodeEntry>>,
    #[serde(rename = "latest_code")]
    pub latest_entry: Option<Arc<CodeEntry>>,
    pub stats: RoundStats,
    #[serde(rename = "survivals")]
    pub survival_count: u64,
}

impl Snapshot {
    pub fn new(
        settings: Settings,
        history: Vec<Arc<CodeEntry>>,
        latest_entry: Option<Arc<CodeEntry>>,
        stats: RoundStats,
        survival_count: u64,
    ) -> Self {
        let latest_entry = match (latest_entry, history.last()) {
            (Some(latest), Some(last)) if *latest == **last => Some(Arc::clone(last)),
            (latest, _) => latest,
        };
        Self {
            settings,
            history,
            latest_entry,
            stats,
            survival_count,
        }
    }

    /// Append a record and make it the latest one.
    pub fn push_entry(&mut self, entry: CodeEntry) {
        let entry = Arc::new(entry);
        self.latest_entry = Some(Arc::clone(&entry));
        self.history.push(entry);
    }

    pub fn latest_entry(&self) -> Option<&CodeEntry> {
        self.latest_entry.as_deref()
    }

    /// Whether `latest_entry` is absent or is the newest history record.
    pub fn latest_is_consistent(&self) -> bool {
        match (&self.latest_entry, self.history.last()) {
            (None, _) => true,
            (Some(latest), Some(last)) => latest == last,
            (Some(_), None) => false,
        }
    }
}

#[derive(Deserialize)]
struct SnapshotRepr {
    settings: Settings,
    history: Vec<Arc<CodeEntry>>,
    #[serde(default)]
    latest_code: Option<Arc<CodeEntry>>,
    stats: RoundStats,
    survivals: u64,
}

impl From<SnapshotRepr> for Snapshot {
    fn from(repr: SnapshotRepr) -> Self {
        Snapshot::new(
            repr.settings,
            repr.history,
            repr.latest_code,
            repr.stats,
            repr.survivals,
        )
    }
}
