use crate::hub::OrderHub;
use orders_core::detect::Baseline;
use orders_core::fetch::SnapshotSource;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// What one poll iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The snapshot changed and was pushed to this many subscribers.
    Broadcast { delivered: usize },
    Unchanged,
}

/// Background poller: fetch, compare against the last broadcast, push on change.
pub struct OrderMonitor<S> {
    source: S,
    hub: Arc<OrderHub>,
    interval: Duration,
    baseline: Baseline,
}

impl<S: SnapshotSource> OrderMonitor<S> {
    pub fn new(source: S, hub: Arc<OrderHub>, interval: Duration) -> Self {
        Self {
            source,
            hub,
            interval,
            baseline: Baseline::new(),
        }
    }

    /// Run a single fetch/detect/broadcast iteration.
    ///
    /// The baseline only moves after a successful broadcast; on error the
    /// hub and baseline are left exactly as they were.
    pub async fn poll_once(&mut self) -> anyhow::Result<PollOutcome> {
        let snapshot = self.source.fetch().await?;
        if !self.baseline.has_changed(&snapshot) {
            return Ok(PollOutcome::Unchanged);
        }
        let delivered = self
            .hub
            .broadcast_snapshot(&snapshot.orders, Some(&snapshot.pending_customer_ids))?;
        let first = self.baseline.is_empty();
        self.baseline.record(&snapshot);
        tracing::info!(
            first,
            orders = snapshot.orders.len(),
            pending = snapshot.pending_customer_ids.len(),
            subscribers = delivered,
            "broadcast order snapshot"
        );
        Ok(PollOutcome::Broadcast { delivered })
    }

    /// Poll forever on a fixed interval. Errors are logged and the loop
    /// carries on at the next tick.
    pub async fn run(mut self) {
        loop {
            if let Err(e) = self.poll_once().await {
                tracing::warn!("order monitor poll failed: {e:#}");
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Like [`OrderMonitor::run`], but returns once `shutdown` resolves. An
    /// in-flight fetch is dropped; nothing is broadcast for it.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) {
        tokio::select! {
            _ = self.run() => {}
            _ = shutdown => {
                tracing::info!("order monitor stopped");
            }
        }
    }
}

impl<S: SnapshotSource + 'static> OrderMonitor<S> {
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orders_core::error::{OrdersError, Result};
    use orders_core::types::{OrderView, Snapshot};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of fetch results, then repeats the last good one.
    struct Scripted {
        script: Mutex<VecDeque<Result<Snapshot>>>,
        fallback: Snapshot,
    }

    impl Scripted {
        fn new(script: Vec<Result<Snapshot>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback: Snapshot::default(),
            }
        }
    }

    impl SnapshotSource for Scripted {
        async fn fetch(&self) -> Result<Snapshot> {
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    fn snap(status: &str, pending: &[&str]) -> Snapshot {
        Snapshot {
            orders: vec![OrderView::new("42", "42", status)],
            pending_customer_ids: pending.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn down() -> Result<Snapshot> {
        Err(OrdersError::InvalidConfig("upstream down".into()))
    }

    fn monitor(script: Vec<Result<Snapshot>>) -> (OrderMonitor<Scripted>, Arc<OrderHub>) {
        let hub = Arc::new(OrderHub::new());
        let m = OrderMonitor::new(Scripted::new(script), hub.clone(), Duration::from_millis(5));
        (m, hub)
    }

    #[tokio::test]
    async fn first_snapshot_is_broadcast_then_unchanged_is_skipped() {
        let (mut m, hub) = monitor(vec![Ok(snap("In progress", &[])), Ok(snap("In progress", &[]))]);
        let mut sub = hub.connect();

        assert_eq!(m.poll_once().await.unwrap(), PollOutcome::Broadcast { delivered: 1 });
        assert_eq!(m.poll_once().await.unwrap(), PollOutcome::Unchanged);

        assert!(sub.recv().await.unwrap().contains("In progress"));
        assert!(hub.latest_snapshot().unwrap().contains(r#""pendingCustomerIds":[]"#));
    }

    #[tokio::test]
    async fn failed_poll_keeps_previous_state() {
        let (mut m, hub) = monitor(vec![
            Ok(snap("In progress", &[])),
            down(),
            Ok(snap("In progress", &[])),
            Ok(snap("Finished", &[])),
        ]);

        m.poll_once().await.unwrap();
        let before = hub.latest_snapshot();

        assert!(m.poll_once().await.is_err());
        assert_eq!(hub.latest_snapshot(), before);

        // Same data as before the failure: no spurious broadcast.
        assert_eq!(m.poll_once().await.unwrap(), PollOutcome::Unchanged);
        assert!(matches!(
            m.poll_once().await.unwrap(),
            PollOutcome::Broadcast { .. }
        ));
        assert!(hub.latest_snapshot().unwrap().contains("Finished"));
    }

    #[tokio::test]
    async fn pending_only_change_is_broadcast() {
        let (mut m, _hub) = monitor(vec![
            Ok(snap("Finished", &["c1"])),
            Ok(snap("Finished", &["c1", "c2"])),
        ]);
        m.poll_once().await.unwrap();
        assert!(matches!(
            m.poll_once().await.unwrap(),
            PollOutcome::Broadcast { .. }
        ));
    }

    #[tokio::test]
    async fn run_survives_errors_and_stops_on_shutdown() {
        let (m, hub) = monitor(vec![down(), down(), Ok(snap("Finished", &[]))]);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(m.run_until(async {
            let _ = stop_rx.await;
        }));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while hub.latest_snapshot().is_none() {
            assert!(tokio::time::Instant::now() < deadline, "monitor never broadcast");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("monitor did not stop")
            .unwrap();
    }
}
