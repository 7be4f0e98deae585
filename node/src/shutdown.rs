//! Graceful shutdown coordination.
//!
//! SIGINT/SIGTERM (or a programmatic call) is fanned out to every
//! subscriber through a `tokio::sync::broadcast` channel.

use std::future::Future;

use tokio::signal;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// A future that resolves once shutdown has been triggered.
    ///
    /// The subscription is taken eagerly, so a trigger that happens after
    /// this call but before the future is first polled is not missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            // Closed also means no one can trigger shutdown any more.
            let _ = rx.recv().await;
        }
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "SIGTERM handler unavailable; only SIGINT will stop the node");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.shutdown();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn signalled_future_sees_trigger_before_first_poll() {
        let controller = ShutdownController::new();
        let fut = controller.signalled();
        controller.shutdown();
        tokio::time::timeout(Duration::from_secs(1), fut)
            .await
            .expect("shutdown future should resolve");
    }

    #[tokio::test]
    async fn signalled_future_waits_for_trigger() {
        let controller = ShutdownController::new();
        let fut = controller.signalled();
        assert!(tokio::time::timeout(Duration::from_millis(50), fut).await.is_err());
    }
}
