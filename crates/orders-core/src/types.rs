use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// The three upstream record collections a snapshot is reconciled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    HandleOrder,
    OrderStatus,
    CustomerOrder,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::HandleOrder => "HandleOrder",
            Collection::OrderStatus => "OrderStatus",
            Collection::CustomerOrder => "CustomerOrder",
        }
    }

    /// Path of the raw listing endpoint, relative to the upstream base URL.
    pub fn raw_path(self) -> String {
        format!("/api/raw/{}", self.as_str())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderView / Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: String,
    pub number: String,
    pub status: String,
}

impl OrderView {
    pub fn new(id: impl Into<String>, number: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            status: status.into(),
        }
    }

    pub fn phase(&self) -> StatusPhase {
        StatusPhase::classify(&self.status)
    }
}

/// One reconciled point-in-time view of visible and pending orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub orders: Vec<OrderView>,
    pub pending_customer_ids: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// SnapshotMessage
// ---------------------------------------------------------------------------

/// Payload pushed to subscribers; serialized as
/// `{"type":"snapshot","orders":[...],"pendingCustomerIds":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotMessage {
    Snapshot {
        orders: Vec<OrderView>,
        #[serde(
            rename = "pendingCustomerIds",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        pending_customer_ids: Option<BTreeSet<String>>,
    },
}

impl SnapshotMessage {
    pub fn orders(&self) -> &[OrderView] {
        match self {
            SnapshotMessage::Snapshot { orders, .. } => orders,
        }
    }

    pub fn summary(&self) -> OrderSummary {
        let SnapshotMessage::Snapshot {
            orders,
            pending_customer_ids,
        } = self;
        let mut summary = OrderSummary {
            pending: pending_customer_ids.as_ref().map_or(0, BTreeSet::len),
            ..OrderSummary::default()
        };
        for order in orders {
            match order.phase() {
                StatusPhase::Pending => summary.pending += 1,
                StatusPhase::InProgress => summary.in_progress += 1,
                StatusPhase::Finished => summary.finished += 1,
                StatusPhase::Other => summary.other += 1,
            }
        }
        summary.total = summary.pending + summary.in_progress + summary.finished + summary.other;
        summary
    }
}

// ---------------------------------------------------------------------------
// StatusPhase / OrderSummary
// ---------------------------------------------------------------------------

/// Coarse grouping of free-text status titles, as shown on the staff board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPhase {
    Pending,
    InProgress,
    Finished,
    Other,
}

impl StatusPhase {
    pub fn classify(status: &str) -> StatusPhase {
        match status.trim().to_lowercase().as_str() {
            "in progress" | "in_progress" | "inprogress" | "processing" | "ongoing"
            | "progress" => StatusPhase::InProgress,
            "finished" | "complete" | "completed" | "done" => StatusPhase::Finished,
            "pending" | "new" | "waiting" | "queued" => StatusPhase::Pending,
            _ => StatusPhase::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusPhase::Pending => "pending",
            StatusPhase::InProgress => "in_progress",
            StatusPhase::Finished => "finished",
            StatusPhase::Other => "other",
        }
    }
}

impl fmt::Display for StatusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub pending: usize,
    pub in_progress: usize,
    pub finished: usize,
    pub other: usize,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_raw_paths() {
        let paths: Vec<String> = [
            Collection::HandleOrder,
            Collection::OrderStatus,
            Collection::CustomerOrder,
        ]
        .into_iter()
        .map(Collection::raw_path)
        .collect();
        assert_eq!(
            paths,
            vec![
                "/api/raw/HandleOrder",
                "/api/raw/OrderStatus",
                "/api/raw/CustomerOrder"
            ]
        );
    }

    #[test]
    fn snapshot_message_wire_shape() {
        let msg = SnapshotMessage::Snapshot {
            orders: vec![OrderView::new("42", "42", "In progress")],
            pending_customer_ids: Some(BTreeSet::from(["c2".to_string()])),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "snapshot",
                "orders": [{ "id": "42", "number": "42", "status": "In progress" }],
                "pendingCustomerIds": ["c2"]
            })
        );
    }

    #[test]
    fn snapshot_message_omits_absent_pending_ids() {
        let msg = SnapshotMessage::Snapshot {
            orders: vec![],
            pending_customer_ids: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"snapshot","orders":[]}"#);
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(StatusPhase::classify("In progress"), StatusPhase::InProgress);
        assert_eq!(StatusPhase::classify(" DONE "), StatusPhase::Finished);
        assert_eq!(StatusPhase::classify("Queued"), StatusPhase::Pending);
        assert_eq!(StatusPhase::classify("Canceled"), StatusPhase::Other);
    }

    #[test]
    fn summary_counts_pending_ids_and_phases() {
        let msg = SnapshotMessage::Snapshot {
            orders: vec![
                OrderView::new("1", "1", "In progress"),
                OrderView::new("2", "2", "Finished"),
                OrderView::new("3", "3", "Finished"),
                OrderView::new("4", "4", "Delayed"),
            ],
            pending_customer_ids: Some(BTreeSet::from(["c5".to_string(), "c6".to_string()])),
        };
        assert_eq!(
            msg.summary(),
            OrderSummary {
                pending: 2,
                in_progress: 1,
                finished: 2,
                other: 1,
                total: 6,
            }
        );
    }
}
