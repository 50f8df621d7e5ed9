//! Shared fixtures and fakes for companion integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use companion::Error;
use companion::domain::{CodeEntry, RoundStats, RoundTypeStats, Settings, Snapshot};
use companion::gateway::DirectoryPicker;
use companion::stores::SnapshotStore;
use companion::update::{CheckOutcome, Progress, UpdateInfo, UpdateOrchestrator, UpdateSource, UpdateStatus};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

pub const WAIT: Duration = Duration::from_secs(5);

/// Snapshot with `rounds` entries, the last one being the latest.
pub fn fixture_snapshot(rounds: usize) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for index in 0..rounds {
        snapshot.push_entry(CodeEntry::new(
            format!("CODE{index}"),
            format!("2025-03-01T12:{index:02}:00"),
            Some(if index % 2 == 0 { "Classic" } else { "Fog" }.to_owned()),
        ));
    }
    let deaths = (rounds / 3) as u64;
    let mut stats = RoundStats {
        total_rounds: rounds as u64,
        deaths,
        round_types: Default::default(),
    };
    stats.round_types.insert(
        "Classic".into(),
        RoundTypeStats {
            survivals: rounds as u64 - deaths,
            deaths,
        },
    );
    snapshot.stats = stats;
    snapshot.survival_count = rounds as u64 - deaths;
    snapshot.settings = Settings::new(Some("/srv/logs".into()));
    snapshot
}

pub async fn wait_for_status(updater: &UpdateOrchestrator, status: UpdateStatus) {
    let mut rx = updater.subscribe();
    tokio::time::timeout(WAIT, rx.wait_for(|state| state.status() == status))
        .await
        .expect("timed out waiting for update status")
        .expect("orchestrator dropped");
}

pub async fn wait_for_progress(updater: &UpdateOrchestrator, progress: Progress) {
    let mut rx = updater.subscribe();
    tokio::time::timeout(WAIT, rx.wait_for(|state| state.progress() == Some(progress)))
        .await
        .expect("timed out waiting for progress")
        .expect("orchestrator dropped");
}

pub async fn wait_for_revision(store: &SnapshotStore, revision: u64) {
    let mut rx = store.subscribe();
    tokio::time::timeout(WAIT, rx.wait_for(|current| *current >= revision))
        .await
        .expect("timed out waiting for store revision")
        .expect("store dropped");
}

/// Update source whose calls block until the test hands out permits.
pub struct GatedSource {
    outcome: Mutex<Result<CheckOutcome, String>>,
    chunks: Vec<Progress>,
    download_failure: Option<String>,
    check_gate: Semaphore,
    download_gate: Semaphore,
    checks: AtomicUsize,
    downloads: AtomicUsize,
}

impl GatedSource {
    pub fn new(outcome: Result<CheckOutcome, String>) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            chunks: Vec::new(),
            download_failure: None,
            check_gate: Semaphore::new(0),
            download_gate: Semaphore::new(0),
            checks: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn available(version: &str) -> Self {
        Self::new(Ok(CheckOutcome::Available(UpdateInfo::new(version))))
    }

    pub fn with_chunks(mut self, chunks: impl IntoIterator<Item = Progress>) -> Self {
        self.chunks = chunks.into_iter().collect();
        self
    }

    pub fn failing_download(mut self, reason: &str) -> Self {
        self.download_failure = Some(reason.to_owned());
        self
    }

    /// Let every call through without waiting.
    pub fn ungated(self) -> Self {
        self.check_gate.add_permits(1024);
        self.download_gate.add_permits(1024);
        self
    }

    pub fn set_outcome(&self, outcome: Result<CheckOutcome, String>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn release_check(&self) {
        self.check_gate.add_permits(1);
    }

    pub fn release_download(&self) {
        self.download_gate.add_permits(1);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateSource for GatedSource {
    async fn check(&self) -> Result<CheckOutcome, Error> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.check_gate.acquire().await.unwrap().forget();
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map_err(Error::BackendUnavailable)
    }

    async fn download_and_install(
        &self,
        _info: &UpdateInfo,
        on_progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<(), Error> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        for chunk in &self.chunks {
            on_progress(*chunk);
        }
        self.download_gate.acquire().await.unwrap().forget();
        match &self.download_failure {
            Some(reason) => Err(Error::BackendUnavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Picker returning a fixed answer and counting how often it was opened.
pub struct FixedPicker {
    answer: Result<Option<String>, ()>,
    opened: AtomicUsize,
}

impl FixedPicker {
    pub fn picks(dir: &str) -> Self {
        Self {
            answer: Ok(Some(dir.to_owned())),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn closes() -> Self {
        Self {
            answer: Ok(None),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn cancels() -> Self {
        Self {
            answer: Err(()),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryPicker for FixedPicker {
    async fn pick_directory(&self) -> Result<Option<String>, Error> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(|()| Error::UserCancelled)
    }
}
