use crate::types::Snapshot;
use std::collections::{BTreeSet, HashMap, HashSet};

pub type StatusByNumber = HashMap<String, String>;

/// Order number → status. When two orders share a number the later one wins.
pub fn status_by_number(snapshot: &Snapshot) -> StatusByNumber {
    snapshot
        .orders
        .iter()
        .map(|o| (o.number.clone(), o.status.clone()))
        .collect()
}

fn fold_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
    ids.into_iter().map(|id| id.to_lowercase()).collect()
}

/// Whether `snapshot` differs from the last broadcast state.
///
/// Statuses compare exactly; pending ids compare as case-insensitive sets.
pub fn has_changed(
    prev_status_by_number: &StatusByNumber,
    prev_pending_ids: &BTreeSet<String>,
    snapshot: &Snapshot,
) -> bool {
    status_by_number(snapshot) != *prev_status_by_number
        || fold_ids(prev_pending_ids) != fold_ids(&snapshot.pending_customer_ids)
}

/// The state as of the last successful broadcast.
///
/// Starts empty; an empty baseline treats any snapshot as a change so the
/// first good poll always produces a payload for late subscribers.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    recorded: Option<(StatusByNumber, BTreeSet<String>)>,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_none()
    }

    pub fn has_changed(&self, snapshot: &Snapshot) -> bool {
        match &self.recorded {
            None => true,
            Some((statuses, pending)) => has_changed(statuses, pending, snapshot),
        }
    }

    pub fn record(&mut self, snapshot: &Snapshot) {
        self.recorded = Some((
            status_by_number(snapshot),
            snapshot.pending_customer_ids.clone(),
        ));
    }
}
