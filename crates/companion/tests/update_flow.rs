#![forbid(unsafe_code)]

mod common;

use async_trait::async_trait;
use common::{GatedSource, wait_for_status};
use companion::backend::{CHECK_UPDATE, Release, UPDATE_PROGRESS};
use companion::update::{
    CheckOutcome, Progress, UpdateInfo, UpdateManifest, UpdateOrchestrator, UpdateSource,
    UpdateState, UpdateStatus,
};
use companion::view::UpdatePresentation;
use companion::{AppContext, Error, InMemoryBackend, Services};
use config::Config;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex, OnceLock};

/// Records the orchestrator state right after each progress report.
struct ProgressRecorder {
    chunks: Vec<Progress>,
    updater: OnceLock<UpdateOrchestrator>,
    seen: Mutex<Vec<UpdateState>>,
}

impl ProgressRecorder {
    fn attach(chunks: impl IntoIterator<Item = Progress>) -> (Arc<Self>, UpdateOrchestrator) {
        let recorder = Arc::new(Self {
            chunks: chunks.into_iter().collect(),
            updater: OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        });
        let updater = UpdateOrchestrator::new(recorder.clone());
        recorder.updater.set(updater.clone()).unwrap();
        (recorder, updater)
    }

    fn seen_progress(&self) -> Vec<Option<Progress>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(UpdateState::progress)
            .collect()
    }
}

#[async_trait]
impl UpdateSource for ProgressRecorder {
    async fn check(&self) -> Result<CheckOutcome, Error> {
        Ok(CheckOutcome::Available(UpdateInfo::new("1.2.0")))
    }

    async fn download_and_install(
        &self,
        _info: &UpdateInfo,
        on_progress: &(dyn Fn(Progress) + Send + Sync),
    ) -> Result<(), Error> {
        for chunk in &self.chunks {
            on_progress(*chunk);
            if let Some(updater) = self.updater.get() {
                self.seen.lock().unwrap().push(updater.state());
            }
        }
        Ok(())
    }
}

fn started_context(backend: &Arc<InMemoryBackend>, current_version: Option<&str>) -> AppContext {
    let mut config = Config::default();
    config.updater.current_version = current_version.map(str::to_owned);
    let services = Services::from_backend(Arc::clone(backend), &config);
    AppContext::new(config, services)
}

#[tokio::test]
async fn available_update_downloads_to_ready() {
    let (recorder, updater) =
        ProgressRecorder::attach([Progress::new(50, Some(100)), Progress::new(100, Some(100))]);

    let state = updater.check_for_updates().await;
    assert_eq!(state, UpdateState::Available(UpdateInfo::new("1.2.0")));

    let state = updater.download_and_install().await;

    assert_eq!(
        recorder.seen_progress(),
        vec![
            Some(Progress::new(50, Some(100))),
            Some(Progress::new(100, Some(100))),
        ]
    );
    assert_eq!(state, UpdateState::ReadyToInstall(UpdateInfo::new("1.2.0")));
    assert_eq!(updater.state(), state);
}

#[tokio::test]
async fn regressing_progress_is_ignored() {
    let (recorder, updater) = ProgressRecorder::attach([
        Progress::new(60, None),
        Progress::new(30, Some(100)),
        Progress::new(80, Some(100)),
    ]);
    updater.check_for_updates().await;
    updater.download_and_install().await;

    assert_eq!(
        recorder.seen_progress(),
        vec![
            Some(Progress::new(60, None)),
            Some(Progress::new(60, None)),
            Some(Progress::new(80, Some(100))),
        ]
    );
}

#[tokio::test]
async fn only_one_check_runs_at_a_time() {
    let source = Arc::new(GatedSource::available("1.2.0"));
    let updater = UpdateOrchestrator::new(source.clone());

    let first = tokio::spawn({
        let updater = updater.clone();
        async move { updater.check_for_updates().await }
    });
    wait_for_status(&updater, UpdateStatus::Checking).await;

    assert_eq!(updater.check_for_updates().await, UpdateState::Checking);
    assert_eq!(updater.download_and_install().await, UpdateState::Checking);
    assert!(!updater.dismiss());

    source.release_check();
    let state = first.await.unwrap();
    assert_eq!(state.status(), UpdateStatus::Available);
    assert_eq!(source.checks(), 1);
}

#[tokio::test]
async fn dismiss_is_ignored_while_downloading() {
    let source = Arc::new(
        GatedSource::available("1.2.0").with_chunks([Progress::new(10, Some(40))]),
    );
    source.release_check();
    let updater = UpdateOrchestrator::new(source.clone());
    updater.check_for_updates().await;

    let download = tokio::spawn({
        let updater = updater.clone();
        async move { updater.download_and_install().await }
    });
    common::wait_for_progress(&updater, Progress::new(10, Some(40))).await;

    assert!(!updater.dismiss());
    assert_eq!(updater.check_for_updates().await.status(), UpdateStatus::Downloading);
    assert_eq!(updater.status(), UpdateStatus::Downloading);

    source.release_download();
    assert_eq!(download.await.unwrap().status(), UpdateStatus::ReadyToInstall);
    assert_eq!(source.downloads(), 1);

    assert!(!updater.dismiss());
    assert_eq!(updater.check_for_updates().await.status(), UpdateStatus::ReadyToInstall);
    assert_eq!(source.checks(), 1);
}

#[tokio::test]
async fn failed_check_can_be_dismissed_and_retried() {
    let source = Arc::new(GatedSource::new(Err("offline".into())));
    source.release_check();
    let updater = UpdateOrchestrator::new(source.clone());

    let state = updater.check_for_updates().await;
    let message = state.error().unwrap();
    assert!(message.contains("update check failed"), "{message}");
    assert!(message.contains("offline"), "{message}");

    assert!(updater.dismiss());
    assert_eq!(updater.state(), UpdateState::Idle);
    assert!(!updater.dismiss());

    let retry = tokio::spawn({
        let updater = updater.clone();
        async move { updater.check_for_updates().await }
    });
    wait_for_status(&updater, UpdateStatus::Checking).await;

    source.set_outcome(Ok(CheckOutcome::UpToDate));
    source.release_check();
    assert_eq!(retry.await.unwrap(), UpdateState::UpToDate);
    assert_eq!(source.checks(), 2);
}

#[tokio::test]
async fn failed_download_discards_progress() {
    let source = Arc::new(
        GatedSource::available("2.0.0")
            .with_chunks([Progress::new(10, Some(100))])
            .failing_download("disk full")
            .ungated(),
    );
    let updater = UpdateOrchestrator::new(source.clone());
    updater.check_for_updates().await;

    let state = updater.download_and_install().await;

    assert_eq!(state.status(), UpdateStatus::Error);
    assert_eq!(state.progress(), None);
    assert_eq!(state.info(), None);
    let message = state.error().unwrap();
    assert!(message.contains("update download failed"), "{message}");
    assert!(message.contains("disk full"), "{message}");

    assert!(updater.dismiss());
    assert_eq!(updater.status(), UpdateStatus::Idle);
}

#[tokio::test]
async fn download_requires_an_available_release() {
    let source = Arc::new(GatedSource::new(Ok(CheckOutcome::UpToDate)).ungated());
    let updater = UpdateOrchestrator::new(source.clone());

    assert_eq!(updater.download_and_install().await, UpdateState::Idle);
    updater.check_for_updates().await;
    assert_eq!(updater.download_and_install().await, UpdateState::UpToDate);
    assert_eq!(source.downloads(), 0);
}

#[tokio::test]
async fn startup_check_finds_backend_release() {
    let mut manifest = UpdateManifest::new("1.2.0");
    manifest.current_version = Some("1.1.0".into());
    manifest.body = Some("Bug fixes".into());
    let release = Release::new(manifest)
        .with_chunks([Progress::new(50, Some(100)), Progress::new(100, Some(100))]);
    let backend = Arc::new(InMemoryBackend::default().with_release(release));
    let context = started_context(&backend, None);

    context.start().await.unwrap();
    wait_for_status(context.updater(), UpdateStatus::Available).await;

    let state = context.updater().state();
    let info = state.info().unwrap();
    assert_eq!(info.version, "1.2.0");
    assert_eq!(info.current_version.as_deref(), Some("1.1.0"));
    assert_eq!(info.notes.as_deref(), Some("Bug fixes"));
    assert_eq!(backend.invocations(CHECK_UPDATE), 1);
    assert!(context.updates().banner_visible());

    let state = context.updater().download_and_install().await;

    assert_eq!(state.status(), UpdateStatus::ReadyToInstall);
    assert_eq!(backend.listener_count(UPDATE_PROGRESS), 0);
    assert!(!context.updates().banner_visible());
}

#[tokio::test]
async fn release_not_newer_than_current_is_up_to_date() {
    for (offered, current) in [("1.0.0", "1.0.0"), ("0.9.5", "1.0.0")] {
        let backend = Arc::new(
            InMemoryBackend::default().with_release(Release::new(UpdateManifest::new(offered))),
        );
        let context = started_context(&backend, Some(current));

        let state = context.updater().check_for_updates().await;

        assert_eq!(state, UpdateState::UpToDate, "{offered} vs {current}");
    }
}

#[tokio::test]
async fn missing_release_is_up_to_date() {
    let backend = Arc::new(InMemoryBackend::default());
    let context = started_context(&backend, Some("1.0.0"));

    assert_eq!(context.updater().check_for_updates().await, UpdateState::UpToDate);
}

#[tokio::test]
async fn unparsable_release_version_fails_the_check() {
    let backend = Arc::new(
        InMemoryBackend::default().with_release(Release::new(UpdateManifest::new("banana"))),
    );
    let context = started_context(&backend, Some("1.0.0"));

    let state = context.updater().check_for_updates().await;

    let message = state.error().unwrap();
    assert!(message.contains("invalid version"), "{message}");
}

#[tokio::test]
async fn backend_download_failure_is_reported() {
    let release = Release::new(UpdateManifest::new("3.0.0"))
        .with_chunks([Progress::new(5, Some(10))])
        .failing("checksum mismatch");
    let backend = Arc::new(InMemoryBackend::default().with_release(release));
    let context = started_context(&backend, Some("2.9.0"));

    context.updater().check_for_updates().await;
    let state = context.updater().download_and_install().await;

    let message = state.error().unwrap();
    assert!(message.contains("checksum mismatch"), "{message}");
    assert_eq!(backend.listener_count(UPDATE_PROGRESS), 0);
}

#[tokio::test]
async fn modal_starts_a_check_and_banner_follows_availability() {
    let source = Arc::new(GatedSource::available("1.2.0").ungated());
    let presentation = UpdatePresentation::new(UpdateOrchestrator::new(source.clone()));
    assert!(!presentation.banner_visible());

    let check = presentation.open_modal().unwrap();
    assert_eq!(check.await.unwrap().status(), UpdateStatus::Available);
    assert!(presentation.is_modal_open());
    assert!(!presentation.banner_visible());

    assert!(presentation.open_modal().is_none());
    presentation.close_modal();
    assert_eq!(presentation.updater().status(), UpdateStatus::Available);
    assert!(presentation.banner_visible());

    presentation.dismiss_banner();
    assert!(!presentation.banner_visible());
    assert_eq!(presentation.updater().status(), UpdateStatus::Available);

    presentation.open_modal_from_banner();
    assert!(presentation.is_modal_open());
    assert_eq!(source.checks(), 1);
}

#[tokio::test]
async fn closing_modal_dismisses_finished_check() {
    let source = Arc::new(GatedSource::new(Ok(CheckOutcome::UpToDate)).ungated());
    let presentation = UpdatePresentation::new(UpdateOrchestrator::new(source.clone()));

    let check = presentation.open_modal().unwrap();
    assert_eq!(check.await.unwrap(), UpdateState::UpToDate);

    let recheck = presentation.open_modal().unwrap();
    assert_eq!(recheck.await.unwrap(), UpdateState::UpToDate);
    assert_eq!(source.checks(), 2);

    presentation.close_modal();
    assert!(!presentation.is_modal_open());
    assert_eq!(presentation.updater().state(), UpdateState::Idle);
}
