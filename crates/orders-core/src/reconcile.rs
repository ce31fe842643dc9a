//! Turns the three raw collections into a [`Snapshot`].
//!
//! An order only becomes a visible row once a handle record ties it to a
//! status. Customer orders nobody has picked up yet are reported through
//! `pending_customer_ids` and never as rows.

use crate::records::{RawCustomerOrderRecord, RawHandleRecord, RawStatusRecord, RawTitledRecord};
use crate::types::{OrderView, Snapshot};
use std::collections::{BTreeSet, HashMap, HashSet};

pub const PENDING: &str = "Pending";
pub const CANCELED: &str = "Canceled";

/// Statuses that are never broadcast as rows.
pub fn is_hidden_status(status: &str) -> bool {
    status.eq_ignore_ascii_case(PENDING) || status.eq_ignore_ascii_case(CANCELED)
}

fn title_lookup(records: &[RawTitledRecord]) -> HashMap<&str, &str> {
    records.iter().filter_map(RawTitledRecord::entry).collect()
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn reconcile(
    handles: &[RawHandleRecord],
    statuses: &[RawStatusRecord],
    customer_orders: &[RawCustomerOrderRecord],
) -> Snapshot {
    let status_titles = title_lookup(statuses);
    let customer_titles = title_lookup(customer_orders);

    let mut handled: HashSet<&str> = HashSet::new();
    let mut views: Vec<OrderView> = Vec::new();

    for handle in handles {
        let Some(part) = handle.handle_order.as_ref() else {
            tracing::debug!(
                handle = handle.id().unwrap_or_default(),
                "handle record has no HandleOrder part"
            );
            continue;
        };

        let status = part
            .status_id()
            .and_then(|id| status_titles.get(id).copied())
            .unwrap_or("");
        let customer_id = part.customer_order_id();
        let number = customer_id
            .and_then(|id| customer_titles.get(id).copied())
            .or_else(|| handle.title())
            .unwrap_or("");

        // A handle that still reads "Pending" has not been accepted yet.
        if let Some(id) = customer_id {
            if !status.eq_ignore_ascii_case(PENDING) {
                handled.insert(id);
            }
        }

        if !is_blank(number) && !is_blank(status) {
            views.push(OrderView::new(number, number, status));
        }
    }

    let pending_customer_ids: BTreeSet<String> = customer_titles
        .keys()
        .filter(|id| !handled.contains(*id))
        .map(|id| id.to_string())
        .collect();

    for id in &pending_customer_ids {
        let Some(title) = customer_titles.get(id.as_str()).copied() else {
            continue;
        };
        let represented = views.iter().any(|v| v.number == title || v.id == *id);
        if !represented && !is_blank(title) {
            views.push(OrderView::new(title, title, PENDING));
        }
    }

    views.retain(|v| !is_hidden_status(&v.status));

    Snapshot {
        orders: views,
        pending_customer_ids,
    }
}
