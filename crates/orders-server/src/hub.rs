//! In-process fan-out of snapshot payloads to connected subscribers.
//!
//! Every subscriber owns an unbounded queue. A slow client therefore grows
//! its own queue instead of holding up the broadcaster or other clients, and
//! every subscriber sees every broadcast made while it is registered.
//!
//! All operations lock a single mutex for their whole critical section, so
//! `connect`, `disconnect` and `broadcast_snapshot` are atomic with respect
//! to each other. The lock is never held across an `.await`.

use futures::Stream;
use orders_core::types::{OrderView, SnapshotMessage};
use std::collections::{BTreeSet, HashMap};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type Payload = Arc<str>;

#[derive(Default)]
struct HubInner {
    subscribers: HashMap<Uuid, mpsc::UnboundedSender<Payload>>,
    latest: Option<Payload>,
}

#[derive(Default)]
pub struct OrderHub {
    inner: Mutex<HubInner>,
}

/// The receiving end handed to one connection.
///
/// Yields the payload cached at registration time first (if any), then each
/// broadcast in order. Ends once the hub drops the sending side.
pub struct Subscriber {
    pub id: Uuid,
    initial: Option<Payload>,
    rx: mpsc::UnboundedReceiver<Payload>,
}

impl Subscriber {
    pub async fn recv(&mut self) -> Option<Payload> {
        if let Some(first) = self.initial.take() {
            return Some(first);
        }
        self.rx.recv().await
    }
}

impl Stream for Subscriber {
    type Item = Payload;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Payload>> {
        if let Some(first) = self.initial.take() {
            return Poll::Ready(Some(first));
        }
        self.rx.poll_recv(cx)
    }
}

impl OrderHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber. The latest payload is captured under the
    /// same lock, so no broadcast can slip in between it and the live queue.
    pub fn connect(&self) -> Subscriber {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut inner = self.lock();
        inner.subscribers.insert(id, tx);
        let initial = inner.latest.clone();
        let count = inner.subscribers.len();
        drop(inner);
        tracing::debug!(subscriber = %id, subscribers = count, "subscriber connected");
        Subscriber { id, initial, rx }
    }

    /// Remove a subscriber and close its queue. Returns false if it was
    /// already gone.
    pub fn disconnect(&self, id: Uuid) -> bool {
        let removed = self.lock().subscribers.remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "subscriber disconnected");
        }
        removed
    }

    /// Serialize a snapshot, cache it as the latest payload and queue it for
    /// every registered subscriber. Returns the number of queues it reached.
    pub fn broadcast_snapshot(
        &self,
        orders: &[OrderView],
        pending_customer_ids: Option<&BTreeSet<String>>,
    ) -> serde_json::Result<usize> {
        let message = SnapshotMessage::Snapshot {
            orders: orders.to_vec(),
            pending_customer_ids: pending_customer_ids.cloned(),
        };
        let payload: Payload = serde_json::to_string(&message)?.into();
        Ok(self.broadcast_payload(payload))
    }

    fn broadcast_payload(&self, payload: Payload) -> usize {
        let mut inner = self.lock();
        inner.latest = Some(payload.clone());
        // A failed send means the receiver was dropped without a disconnect.
        inner.subscribers.retain(|id, tx| match tx.send(payload.clone()) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(subscriber = %id, "pruned closed subscriber");
                false
            }
        });
        inner.subscribers.len()
    }

    pub fn latest_snapshot(&self) -> Option<Payload> {
        self.lock().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders(status: &str) -> Vec<OrderView> {
        vec![OrderView::new("42", "42", status)]
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let hub = OrderHub::new();
        let mut a = hub.connect();
        let mut b = hub.connect();

        let delivered = hub.broadcast_snapshot(&orders("In progress"), None).unwrap();
        assert_eq!(delivered, 2);

        let expected = r#"{"type":"snapshot","orders":[{"id":"42","number":"42","status":"In progress"}]}"#;
        assert_eq!(a.recv().await.as_deref(), Some(expected));
        assert_eq!(b.recv().await.as_deref(), Some(expected));
    }

    #[tokio::test]
    async fn late_subscriber_gets_latest_first() {
        let hub = OrderHub::new();
        assert!(hub.latest_snapshot().is_none());

        hub.broadcast_snapshot(&orders("In progress"), None).unwrap();
        hub.broadcast_snapshot(&orders("Finished"), None).unwrap();

        let mut late = hub.connect();
        let first = late.recv().await.unwrap();
        assert_eq!(Some(first.clone()), hub.latest_snapshot());
        assert!(first.contains("Finished"));

        hub.broadcast_snapshot(&orders("Picked up"), None).unwrap();
        assert!(late.recv().await.unwrap().contains("Picked up"));
    }

    #[tokio::test]
    async fn identical_broadcasts_are_not_deduplicated() {
        let hub = OrderHub::new();
        let mut sub = hub.connect();
        let pending = BTreeSet::from(["c2".to_string()]);

        hub.broadcast_snapshot(&orders("Finished"), Some(&pending)).unwrap();
        let latest_once = hub.latest_snapshot();
        hub.broadcast_snapshot(&orders("Finished"), Some(&pending)).unwrap();

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_eq!(first, second);
        assert!(first.contains(r#""pendingCustomerIds":["c2"]"#));
        assert_eq!(hub.latest_snapshot(), latest_once);
    }

    #[tokio::test]
    async fn subscriber_sees_broadcasts_in_order() {
        let hub = OrderHub::new();
        let mut sub = hub.connect();
        for status in ["a", "b", "c"] {
            hub.broadcast_snapshot(&orders(status), None).unwrap();
        }
        for status in ["a", "b", "c"] {
            let payload = sub.recv().await.unwrap();
            assert!(payload.contains(&format!(r#""status":"{status}""#)));
        }
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_closes_queue() {
        let hub = OrderHub::new();
        let mut sub = hub.connect();
        assert_eq!(hub.subscriber_count(), 1);

        assert!(hub.disconnect(sub.id));
        assert!(!hub.disconnect(sub.id));
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned_on_broadcast() {
        let hub = OrderHub::new();
        let gone = hub.connect();
        let mut alive = hub.connect();
        drop(gone);

        let delivered = hub.broadcast_snapshot(&orders("Finished"), None).unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(hub.subscriber_count(), 1);
        assert!(alive.recv().await.is_some());
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_block_others() {
        let hub = Arc::new(OrderHub::new());
        let _stalled = hub.connect();
        let mut active = hub.connect();

        for n in 0..1000 {
            hub.broadcast_snapshot(&orders(&n.to_string()), None).unwrap();
        }
        let mut received = 0;
        while received < 1000 {
            active.recv().await.unwrap();
            received += 1;
        }
        assert_eq!(received, 1000);
    }

    #[tokio::test]
    async fn concurrent_connects_and_broadcasts() {
        let hub = Arc::new(OrderHub::new());
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let hub = hub.clone();
            tasks.spawn(async move {
                let mut sub = hub.connect();
                let first = sub.recv().await;
                hub.disconnect(sub.id);
                first
            });
        }
        let broadcaster = {
            let hub = hub.clone();
            tokio::spawn(async move {
                for n in 0..50 {
                    hub.broadcast_snapshot(&orders(&n.to_string()), None).unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };
        broadcaster.await.unwrap();
        hub.broadcast_snapshot(&orders("last"), None).unwrap();

        while let Some(result) = tasks.join_next().await {
            assert!(result.expect("task panicked").is_some());
        }
        assert_eq!(hub.subscriber_count(), 0);
    }
}
