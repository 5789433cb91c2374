//! # Store Connectivity Monitor
//!
//! A background task that probes the store on a fixed heartbeat. When a
//! probe fails it switches to a reconnect loop, retrying at a fixed
//! interval until the store answers again, then goes back to probing.
//!
//! ```text
//!   ┌──────── heartbeat ────────┐
//!   │                           ▼
//! probing ── ping ok ──────── probing
//!   │
//!   └─ ping err ─▶ reconnecting ── reconnect ok ─▶ probing
//!                    │     ▲
//!                    └─err─┘ (sleep retry_delay)
//! ```
//!
//! The task watches a `tokio::sync::watch` shutdown channel in both states
//! and exits promptly once it fires or its sender is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{HEARTBEAT_INTERVAL, RECONNECT_INTERVAL};
use crate::store::LedgerStore;

/// Receives store health transitions. All methods default to no-ops.
pub trait HealthObserver: Send + Sync {
    /// A probe failed.
    fn store_down(&self) {}

    /// About to make reconnect attempt number `attempt` (1-based).
    fn reconnect_attempt(&self, _attempt: u32) {}

    /// A reconnect succeeded.
    fn store_up(&self) {}
}

impl HealthObserver for () {}

/// Supervises store connectivity. Consumed by [`ConnectivityMonitor::spawn`].
pub struct ConnectivityMonitor {
    store: Arc<dyn LedgerStore>,
    heartbeat: Duration,
    retry_delay: Duration,
    observer: Arc<dyn HealthObserver>,
}

impl ConnectivityMonitor {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            heartbeat: HEARTBEAT_INTERVAL,
            retry_delay: RECONNECT_INTERVAL,
            observer: Arc::new(()),
        }
    }

    pub fn with_intervals(mut self, heartbeat: Duration, retry_delay: Duration) -> Self {
        self.heartbeat = heartbeat;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn HealthObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Starts the monitor on the current runtime. The returned handle
    /// completes once `shutdown` fires.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            heartbeat_ms = self.heartbeat.as_millis() as u64,
            retry_ms = self.retry_delay.as_millis() as u64,
            "connectivity monitor started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.heartbeat) => {}
            }

            if let Err(e) = self.store.ping().await {
                tracing::warn!(error = %e, "store probe failed");
                self.observer.store_down();
                if !self.reconnect(&mut shutdown).await {
                    break;
                }
                self.observer.store_up();
            }
        }

        tracing::info!("connectivity monitor stopped");
    }

    /// Retries until the store reconnects (`true`) or shutdown fires
    /// (`false`).
    async fn reconnect(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            self.observer.reconnect_attempt(attempt);

            match self.store.reconnect().await {
                Ok(()) => {
                    tracing::info!(attempt, "store reconnected");
                    return true;
                }
                Err(e) => tracing::warn!(attempt, error = %e, "store reconnect failed"),
            }

            tokio::select! {
                _ = shutdown.changed() => return false,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedger;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl HealthObserver for Recorder {
        fn store_down(&self) {
            self.events.lock().push("down".into());
        }

        fn reconnect_attempt(&self, attempt: u32) {
            self.events.lock().push(format!("attempt {attempt}"));
        }

        fn store_up(&self) {
            self.events.lock().push("up".into());
        }
    }

    fn monitor(store: &Arc<MemoryLedger>) -> ConnectivityMonitor {
        ConnectivityMonitor::new(store.clone())
            .with_intervals(Duration::from_secs(5), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_store_is_only_pinged() {
        let store = Arc::new(MemoryLedger::new());
        let (tx, rx) = watch::channel(false);
        let handle = monitor(&store).spawn(rx);

        tokio::time::sleep(Duration::from_secs(16)).await;
        let _ = tx.send(true);
        handle.await.unwrap();

        assert_eq!(store.calls(), vec!["ping", "ping", "ping"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_retries_until_reconnected() {
        let store = Arc::new(MemoryLedger::new());
        store.fail_pings(1);
        store.fail_reconnects(2);
        let recorder = Arc::new(Recorder::default());

        let (tx, rx) = watch::channel(false);
        let handle = monitor(&store).with_observer(recorder.clone()).spawn(rx);

        // t=5 ping fails, reconnects at 5, 10, 15, healthy ping at 20.
        tokio::time::sleep(Duration::from_secs(21)).await;
        let _ = tx.send(true);
        handle.await.unwrap();

        assert_eq!(
            store.calls(),
            vec!["ping", "reconnect", "reconnect", "reconnect", "ping"]
        );
        assert_eq!(store.reconnect_count(), 1);
        assert_eq!(
            *recorder.events.lock(),
            vec!["down", "attempt 1", "attempt 2", "attempt 3", "up"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_reconnect_loop() {
        let store = Arc::new(MemoryLedger::new());
        store.fail_pings(1);
        store.fail_reconnects(u32::MAX);

        let (tx, rx) = watch::channel(false);
        let handle = monitor(&store).spawn(rx);

        tokio::time::sleep(Duration::from_secs(12)).await;
        let _ = tx.send(true);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop on shutdown")
            .unwrap();
        assert_eq!(store.reconnect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_stops_monitor() {
        let store = Arc::new(MemoryLedger::new());
        let (tx, rx) = watch::channel(false);
        let handle = monitor(&store).spawn(rx);

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop when the sender is gone")
            .unwrap();
        assert!(store.calls().is_empty());
    }
}
