//! Process termination signals.

use std::future::Future;

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Register SIGINT/SIGTERM handlers now; the returned future resolves on
/// the first of either.
///
/// Once registered, the default "terminate the process" action is gone, so
/// a signal that arrives before the future is polled is held until it is.
pub fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("Received SIGINT"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    })
}
