pub mod config;
pub mod detect;
pub mod error;
pub mod fetch;
pub mod reconcile;
pub mod records;
pub mod types;

pub use error::{OrdersError, Result};
pub use fetch::{HttpSnapshotFetcher, SnapshotSource};
pub use types::{OrderView, Snapshot, SnapshotMessage};
