use crate::error::Error;
use flume::Sender;

/// Indefinitely listens to signals and sends signal events to the provided channel.
///
/// SIGUSR1 asks for a state dump, SIGUSR2 for an update check.
#[cfg(unix)]
pub async fn wait_for_signal(signal_event: &Sender<SignalEvent>) -> Result<(), Error> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(Error::SignalHandler)?;
    let mut sigusr2 = signal(SignalKind::user_defined2()).map_err(Error::SignalHandler)?;

    loop {
        tokio::select! {
            _ = sigusr1.recv() => {
                signal_event.send_async(SignalEvent::DumpState).await?;
            }
            _ = sigusr2.recv() => {
                signal_event.send_async(SignalEvent::CheckForUpdates).await?;
            }
        }
    }
}

/// No user signals outside unix; waits forever.
#[cfg(not(unix))]
pub async fn wait_for_signal(_signal_event: &Sender<SignalEvent>) -> Result<(), Error> {
    std::future::pending().await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    DumpState,
    CheckForUpdates,
}
