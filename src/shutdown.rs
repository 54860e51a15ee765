//! Cooperative cancellation driven by SIGINT/SIGTERM.
//!
//! The signal task only flips the flag; the main task notices it at the
//! next loop boundary (or wakes from an interruptible wait) and does the
//! farewell, logging and exit itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Signal that requested the shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    pub fn name(&self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
        }
    }
}

/// Process-wide cancellation flag. Cloning shares the same state.
#[derive(Clone)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
    tx: Arc<watch::Sender<Option<ShutdownSignal>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
        }
    }

    /// Marks shutdown as requested. Only the first signal is recorded.
    pub fn trigger(&self, sig: ShutdownSignal) {
        if self.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tx.send_replace(Some(sig));
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn signal(&self) -> Option<ShutdownSignal> {
        *self.tx.borrow()
    }

    /// Resolves once shutdown is requested; immediately if it already was.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|sig| sig.is_some()).await;
    }

    /// Spawns the task that turns Ctrl+C / SIGTERM into a trigger.
    pub fn listen_for_signals(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sig) => {
                        sig.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received SIGINT (Ctrl+C), shutting down...");
                    shutdown.trigger(ShutdownSignal::Interrupt);
                }
                _ = terminate => {
                    info!("Received SIGTERM, shutting down...");
                    shutdown.trigger(ShutdownSignal::Terminate);
                }
            }
        });
        debug!("Signal listener installed");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_requested());

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger(ShutdownSignal::Interrupt);
        });

        tokio::time::timeout(Duration::from_secs(5), shutdown.wait())
            .await
            .expect("waiter was not woken");
        assert!(shutdown.is_requested());
        assert_eq!(shutdown.signal(), Some(ShutdownSignal::Interrupt));
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownSignal::Terminate);
        shutdown.trigger(ShutdownSignal::Interrupt);

        tokio::time::timeout(Duration::from_millis(100), shutdown.wait())
            .await
            .expect("already-triggered wait blocked");
        assert_eq!(shutdown.signal(), Some(ShutdownSignal::Terminate));
        assert_eq!(ShutdownSignal::Terminate.name(), "SIGTERM");
    }
}
