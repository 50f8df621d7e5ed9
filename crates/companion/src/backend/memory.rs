#![forbid(unsafe_code)]

use super::names::{
    CHECK_UPDATE, DOWNLOAD_AND_INSTALL_UPDATE, GET_STATE, OPEN_SETTINGS, SET_LOG_DIR,
    STATE_UPDATED, UPDATE_PROGRESS,
};
use super::{EventStream, ListenerId, Transport};
use crate::domain::{CodeEntry, Settings, Snapshot};
use crate::error::Error;
use crate::gateway::Autostart;
use crate::update::{Progress, UpdateManifest};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Release offered by [`InMemoryBackend`] through `check_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub manifest: UpdateManifest,
    /// Progress pushed on `update_progress` during the download.
    pub chunks: Vec<Progress>,
    /// Makes the download fail with this reason after all chunks are pushed.
    pub failure: Option<String>,
}

impl Release {
    pub fn new(manifest: UpdateManifest) -> Self {
        Self {
            manifest,
            chunks: Vec::new(),
            failure: None,
        }
    }

    pub fn with_chunks(mut self, chunks: impl IntoIterator<Item = Progress>) -> Self {
        self.chunks = chunks.into_iter().collect();
        self
    }

    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }
}

#[derive(Debug, Default)]
struct BackendState {
    snapshot: Snapshot,
    autostart: bool,
    release: Option<Release>,
    unavailable: Option<String>,
    validate_dirs: bool,
    sequenced: bool,
    seq: u64,
    calls: HashMap<String, usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetLogDirArgs {
    #[serde(default)]
    log_dir: Option<String>,
}

#[derive(Serialize)]
struct SequencedPush<'a> {
    seq: u64,
    #[serde(flatten)]
    snapshot: &'a Snapshot,
}

/// Backend held entirely in process memory.
///
/// Serves the command surface from a [`Snapshot`] it owns and fans pushes
/// out to every registered listener. Used by the headless binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, flume::Sender<Value>)>>>,
    next_listener: AtomicU64,
}

impl InMemoryBackend {
    pub fn new(snapshot: Snapshot) -> Self {
        let backend = Self::default();
        backend.state.lock().snapshot = snapshot;
        backend
    }

    pub fn with_release(self, release: Release) -> Self {
        self.state.lock().release = Some(release);
        self
    }

    pub fn with_autostart(self, enabled: bool) -> Self {
        self.state.lock().autostart = enabled;
        self
    }

    /// Reject `set_log_dir` for paths that are not existing directories.
    pub fn validating_dirs(self) -> Self {
        self.state.lock().validate_dirs = true;
        self
    }

    /// Attach an increasing `seq` to every `state_updated` push.
    pub fn sequenced(self) -> Self {
        self.state.lock().sequenced = true;
        self
    }

    /// Fail every call with [`Error::BackendUnavailable`] while set.
    pub fn set_unavailable(&self, reason: Option<String>) {
        self.state.lock().unavailable = reason;
    }

    pub fn set_release(&self, release: Option<Release>) {
        self.state.lock().release = release;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn autostart_enabled(&self) -> bool {
        self.state.lock().autostart
    }

    /// How many times `command` was invoked.
    pub fn invocations(&self, command: &str) -> usize {
        self.state.lock().calls.get(command).copied().unwrap_or(0)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Mutate the owned snapshot and push it.
    pub fn update_state(&self, f: impl FnOnce(&mut Snapshot)) {
        let payload = {
            let mut state = self.state.lock();
            f(&mut state.snapshot);
            Self::state_payload(&mut state)
        };
        match payload {
            Ok(payload) => self.emit(STATE_UPDATED, payload),
            Err(err) => warn!(%err, "state push not serializable, skipped"),
        }
    }

    pub fn record_entry(&self, entry: CodeEntry) {
        self.update_state(|snapshot| snapshot.push_entry(entry));
    }

    /// Push the owned snapshot unchanged.
    pub fn push_state(&self) {
        self.update_state(|_| {});
    }

    pub fn request_open_settings(&self) {
        self.emit(OPEN_SETTINGS, Value::Null);
    }

    /// Deliver `payload` to every listener of `event`, pruning closed ones.
    pub fn emit(&self, event: &str, payload: Value) {
        let mut listeners = self.listeners.lock();
        let Some(registered) = listeners.get_mut(event) else {
            trace!(event, "no listeners");
            return;
        };
        registered.retain(|(id, sender)| match sender.send(payload.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!(event, id, "pruning closed listener");
                false
            }
        });
    }

    fn state_payload(state: &mut BackendState) -> Result<Value, serde_json::Error> {
        if state.sequenced {
            state.seq += 1;
            serde_json::to_value(SequencedPush {
                seq: state.seq,
                snapshot: &state.snapshot,
            })
        } else {
            serde_json::to_value(&state.snapshot)
        }
    }

    fn encode<T: Serialize>(command: &str, value: &T) -> Result<Value, Error> {
        serde_json::to_value(value).map_err(|err| Error::invalid_response(command, err))
    }

    fn rejected(command: &str, reason: impl Into<String>) -> Error {
        Error::CommandRejected {
            command: command.to_owned(),
            reason: reason.into(),
        }
    }

    fn set_log_dir(&self, args: Value) -> Result<Value, Error> {
        let args: SetLogDirArgs =
            serde_json::from_value(args).map_err(|err| Self::rejected(SET_LOG_DIR, err.to_string()))?;
        let settings = Settings::new(args.log_dir);

        let mut state = self.state.lock();
        if let Some(dir) = settings.log_dir()
            && state.validate_dirs
            && !Path::new(dir).is_dir()
        {
            return Err(Self::rejected(
                SET_LOG_DIR,
                format!("directory does not exist: {dir}"),
            ));
        }
        state.snapshot.settings = settings;
        Self::encode(SET_LOG_DIR, &state.snapshot.settings)
    }

    fn download(&self, args: Value) -> Result<Value, Error> {
        let requested = args.get("version").and_then(Value::as_str).map(str::to_owned);
        let release = self.state.lock().release.clone();
        let Some(release) = release else {
            return Err(Self::rejected(DOWNLOAD_AND_INSTALL_UPDATE, "no release offered"));
        };
        if requested.as_deref() != Some(release.manifest.version.as_str()) {
            return Err(Self::rejected(
                DOWNLOAD_AND_INSTALL_UPDATE,
                format!("unknown version {requested:?}"),
            ));
        }

        for chunk in &release.chunks {
            let payload = Self::encode(UPDATE_PROGRESS, chunk)?;
            self.emit(UPDATE_PROGRESS, payload);
        }
        match release.failure {
            Some(reason) => Err(Self::rejected(DOWNLOAD_AND_INSTALL_UPDATE, reason)),
            None => Ok(Value::Null),
        }
    }

    fn check_available(&self) -> Result<(), Error> {
        match &self.state.lock().unavailable {
            Some(reason) => Err(Error::BackendUnavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for InMemoryBackend {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, Error> {
        {
            let mut state = self.state.lock();
            *state.calls.entry(command.to_owned()).or_default() += 1;
        }
        self.check_available()?;
        trace!(command, %args, "invoke");

        match command {
            GET_STATE => Self::encode(GET_STATE, &self.state.lock().snapshot),
            SET_LOG_DIR => self.set_log_dir(args),
            CHECK_UPDATE => {
                let manifest = self.state.lock().release.as_ref().map(|r| r.manifest.clone());
                Self::encode(CHECK_UPDATE, &manifest)
            }
            DOWNLOAD_AND_INSTALL_UPDATE => self.download(args),
            other => Err(Self::rejected(other, "unknown command")),
        }
    }

    fn listen(&self, event: &str) -> Result<EventStream, Error> {
        self.check_available()?;
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = flume::unbounded();
        self.listeners
            .lock()
            .entry(event.to_owned())
            .or_default()
            .push((id, sender));
        debug!(event, id, "listener registered");
        Ok(EventStream::new(id, event, receiver))
    }

    fn unlisten(&self, id: ListenerId) {
        let mut listeners = self.listeners.lock();
        for registered in listeners.values_mut() {
            registered.retain(|(listener, _)| *listener != id);
        }
        listeners.retain(|_, registered| !registered.is_empty());
    }
}

#[async_trait]
impl Autostart for InMemoryBackend {
    async fn is_enabled(&self) -> Result<bool, Error> {
        self.check_available()?;
        Ok(self.state.lock().autostart)
    }

    async fn enable(&self) -> Result<(), Error> {
        self.check_available()?;
        self.state.lock().autostart = true;
        Ok(())
    }

    async fn disable(&self) -> Result<(), Error> {
        self.check_available()?;
        self.state.lock().autostart = false;
        Ok(())
    }
}
