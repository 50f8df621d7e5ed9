#![forbid(unsafe_code)]

use crate::backend::Transport;
use crate::domain::{Settings, Snapshot};
use crate::error::Error;
use crate::gateway::{Autostart, AutostartToggle, CommandGateway, DirectoryPicker};
use crate::stores::SnapshotStore;
use crate::subscription::EventSubscription;
use crate::update::{TransportUpdateSource, UpdateOrchestrator, UpdateSource};
use crate::view::{Navigation, UpdatePresentation, View};
use config::Config;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// External collaborators of the application context.
pub struct Services {
    pub transport: Arc<dyn Transport>,
    pub autostart: Arc<dyn Autostart>,
    pub updates: Arc<dyn UpdateSource>,
}

impl Services {
    /// Use one backend for commands, events and autostart, and its updater
    /// commands as the update source.
    pub fn from_backend<B>(backend: Arc<B>, config: &Config) -> Self
    where
        B: Transport + Autostart + 'static,
    {
        let transport: Arc<dyn Transport> = backend.clone();
        let updates = TransportUpdateSource::new(
            Arc::clone(&transport),
            config.updater.current_version.clone(),
        );
        Self {
            transport,
            autostart: backend,
            updates: Arc::new(updates),
        }
    }
}

/// Owns every piece of UI-facing state for one application run.
///
/// Built once at startup and shared by reference. Dropping it releases the
/// event subscriptions.
pub struct AppContext {
    config: Config,
    transport: Arc<dyn Transport>,
    store: SnapshotStore,
    gateway: CommandGateway,
    navigation: Navigation,
    autostart: AutostartToggle,
    updates: UpdatePresentation,
    subscriptions: Mutex<Option<EventSubscription>>,
    started: AtomicBool,
}

impl AppContext {
    pub fn new(config: Config, services: Services) -> Self {
        let store = SnapshotStore::new(config.events.drop_stale);
        let gateway = CommandGateway::new(Arc::clone(&services.transport), store.clone());
        let navigation = Navigation::new(config.ui.initial_view);
        let autostart = AutostartToggle::new(services.autostart);
        let updates = UpdatePresentation::new(UpdateOrchestrator::new(services.updates));
        Self {
            config,
            transport: services.transport,
            store,
            gateway,
            navigation,
            autostart,
            updates,
            subscriptions: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Fetch the initial state and autostart flag, then subscribe to pushes.
    ///
    /// Until this resolves the store holds the zero-valued snapshot. Only the
    /// first successful call has any effect, even after [`Self::shutdown`].
    pub async fn start(&self) -> Result<(), Error> {
        if self.is_started() {
            debug!("already started");
            return Ok(());
        }

        let (snapshot, autostart) =
            tokio::try_join!(self.gateway.fetch_state(), self.autostart.refresh())?;
        info!(
            history = snapshot.history.len(),
            total_rounds = snapshot.stats.total_rounds,
            autostart,
            "initial state loaded"
        );

        let subscriptions = EventSubscription::establish(
            Arc::clone(&self.transport),
            self.store.clone(),
            self.navigation.clone(),
        )?;
        {
            let mut slot = self.subscriptions.lock();
            if self.started.swap(true, Ordering::AcqRel) {
                debug!("concurrent start already subscribed");
                return Ok(());
            }
            *slot = Some(subscriptions);
        }

        if self.config.updater.check_on_startup {
            let updater = self.updates.updater().clone();
            tokio::spawn(async move {
                updater.check_for_updates().await;
            });
        }
        Ok(())
    }

    /// Release both event subscriptions. Safe to call any number of times.
    pub fn shutdown(&self) {
        if let Some(subscriptions) = self.subscriptions.lock().take() {
            subscriptions.release();
            info!("event subscriptions released");
        }
    }

    /// Whether [`Self::start`] has completed once.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriptions.lock().is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn gateway(&self) -> &CommandGateway {
        &self.gateway
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn navigate(&self, view: View) {
        self.navigation.navigate(view);
    }

    pub fn updates(&self) -> &UpdatePresentation {
        &self.updates
    }

    pub fn updater(&self) -> &UpdateOrchestrator {
        self.updates.updater()
    }

    pub fn autostart_enabled(&self) -> bool {
        self.autostart.enabled()
    }

    pub async fn toggle_autostart(&self) -> Result<bool, Error> {
        self.autostart.toggle().await
    }

    pub async fn choose_log_dir(
        &self,
        picker: &dyn DirectoryPicker,
    ) -> Result<Option<Settings>, Error> {
        self.gateway.choose_log_dir(picker).await
    }

    pub async fn reset_log_dir(&self) -> Result<Settings, Error> {
        self.gateway.reset_log_dir().await
    }

    /// Log directory as shown in the settings view.
    pub fn log_dir_display(&self) -> String {
        self.store.read(|snapshot| {
            snapshot
                .settings
                .display_log_dir(&self.config.ui.default_log_dir)
                .to_owned()
        })
    }
}
