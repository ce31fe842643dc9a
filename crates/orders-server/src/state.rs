use crate::hub::OrderHub;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub hub: Arc<OrderHub>,
}

impl AppState {
    pub fn new(hub: Arc<OrderHub>) -> Self {
        Self { hub }
    }
}
