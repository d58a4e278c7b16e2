//! Process-wide shutdown signalling
//!
//! A [`ShutdownHandle`] requests shutdown once; every [`ShutdownToken`]
//! cloned from the same channel observes it. Waits in the controller race
//! against [`ShutdownToken::requested`] so a pending wait is abandoned as
//! soon as shutdown is requested.

use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Requests shutdown
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Observes shutdown requests
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/token pair
pub fn channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx: Arc::new(tx) }, ShutdownToken { rx })
}

impl ShutdownHandle {
    /// Request shutdown. Idempotent.
    pub fn request(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownToken {
    /// Whether shutdown has been requested
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested
    ///
    /// Never resolves if every handle is dropped without requesting.
    pub async fn requested(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|requested| *requested).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a future that completes when a shutdown signal is received
///
/// This function listens for:
/// - SIGTERM
/// - SIGINT (Ctrl+C)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}

/// Spawn a task that requests shutdown on the first termination signal
pub fn listen_for_signals(handle: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.request();
    })
}
