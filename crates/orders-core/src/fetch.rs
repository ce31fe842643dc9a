use crate::config::UpstreamConfig;
use crate::error::{OrdersError, Result};
use crate::reconcile::reconcile;
use crate::records::{decode_records, RawCustomerOrderRecord, RawHandleRecord, RawStatusRecord};
use crate::types::{Collection, Snapshot};
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;
use std::future::Future;

/// Anything that can produce a fresh [`Snapshot`] on demand.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot>> + Send;
}

/// Reads the raw listings from the content backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSnapshotFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSnapshotFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET one raw listing. A `null` body counts as an empty list.
    async fn fetch_collection(&self, collection: Collection) -> Result<Vec<Value>> {
        let url = format!("{}{}", self.base_url, collection.raw_path());
        let body = self
            .client
            .get(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| OrdersError::upstream(collection, e))?
            .text()
            .await
            .map_err(|e| OrdersError::upstream(collection, e))?;

        let values: Option<Vec<Value>> =
            serde_json::from_str(&body).map_err(|e| OrdersError::upstream(collection, e))?;
        Ok(values.unwrap_or_default())
    }

    /// Fetch all three listings concurrently and reconcile them.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let (handles, statuses, customers) = tokio::try_join!(
            self.fetch_collection(Collection::HandleOrder),
            self.fetch_collection(Collection::OrderStatus),
            self.fetch_collection(Collection::CustomerOrder),
        )?;

        let handles: Vec<RawHandleRecord> = decode_records(Collection::HandleOrder, handles);
        let statuses: Vec<RawStatusRecord> = decode_records(Collection::OrderStatus, statuses);
        let customers: Vec<RawCustomerOrderRecord> =
            decode_records(Collection::CustomerOrder, customers);

        Ok(reconcile(&handles, &statuses, &customers))
    }
}

impl SnapshotSource for HttpSnapshotFetcher {
    async fn fetch(&self) -> Result<Snapshot> {
        self.fetch_snapshot().await
    }
}
