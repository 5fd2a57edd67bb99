//! Interrupt handling
//!
//! The first SIGINT/SIGTERM cancels the run token so the current step can
//! finish and delays end at their next slice. A second one exits at once.

use std::future::Future;

use session::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Exit status after a forced second interrupt (128 + SIGINT).
pub const FORCED_EXIT_CODE: i32 = 130;

/// Spawn the two-stage interrupt handler for `cancel`.
pub fn spawn_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        escalate(cancel, wait_for_signal).await;
        error!("second interrupt, exiting immediately");
        std::process::exit(FORCED_EXIT_CODE);
    })
}

/// Cancel on the first signal, then return on the second.
pub async fn escalate<F, Fut>(cancel: CancellationToken, mut next_signal: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    next_signal().await;
    warn!("interrupt received, stopping after the current step (interrupt again to exit now)");
    cancel.cancel();
    next_signal().await;
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
