use clap::Parser;
use companion::update::UpdateStatus;
use companion::{AppContext, InMemoryBackend, Services};
use config::Config;
use flume::bounded;
use roundwatch::cli::Cli;
use roundwatch::seed;
use roundwatch::signals::{SignalEvent, wait_for_signal};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.log_level_filter().as_trace())
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let mut config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(version) = &cli.current_version {
        config.updater.current_version = Some(version.clone());
    }

    let snapshot = match &cli.snapshot {
        Some(path) => seed::load_snapshot(path)?,
        None => Default::default(),
    };
    let mut backend = InMemoryBackend::new(snapshot);
    if let Some(version) = &cli.release {
        let current = config.updater.current_version.as_deref();
        backend = backend.with_release(seed::release(version, current));
    }
    let services = Services::from_backend(Arc::new(backend), &config);
    let context = AppContext::new(config, services);

    context.start().await?;
    dump_state(&context);

    if cli.once {
        if context.config().updater.check_on_startup {
            let mut updates = context.updater().subscribe();
            updates
                .wait_for(|state| {
                    !matches!(state.status(), UpdateStatus::Idle | UpdateStatus::Checking)
                })
                .await?;
        }
        info!(update = %context.updater().state(), "startup check finished");
        context.shutdown();
        return Ok(());
    }

    let (events_tx, events_rx) = bounded(8);
    let mut revisions = context.store().subscribe();
    let mut updates = context.updater().subscribe();
    let signals = wait_for_signal(&events_tx);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(signals, ctrl_c);

    loop {
        tokio::select! {
            res = &mut signals => {
                error!(error = ?res, "Signal listener stopped");
                res?;
                break;
            }
            res = events_rx.recv_async() => {
                let event = res?;
                debug!(?event, "Received signal event");
                match event {
                    SignalEvent::DumpState => dump_state(&context),
                    SignalEvent::CheckForUpdates => {
                        let updater = context.updater().clone();
                        tokio::spawn(async move { updater.check_for_updates().await });
                    }
                }
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                let revision = *revisions.borrow_and_update();
                debug!(revision, "store updated");
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                info!(%state, "update state changed");
            }
            res = &mut ctrl_c => {
                res?;
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    context.shutdown();
    Ok(())
}

fn dump_state(context: &AppContext) {
    let snapshot = context.snapshot();
    info!(
        revision = context.store().revision(),
        history = snapshot.history.len(),
        total_rounds = snapshot.stats.total_rounds,
        deaths = snapshot.stats.deaths,
        survivals = snapshot.survival_count,
        latest = ?snapshot.latest_entry().map(|entry| entry.code()),
        log_dir = %context.log_dir_display(),
        autostart = context.autostart_enabled(),
        view = %context.navigation().current(),
        update = %context.updater().state(),
        "state"
    );
}
