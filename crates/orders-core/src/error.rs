use crate::types::Collection;
use thiserror::Error;

/// Why a single upstream collection could not be turned into records.
#[derive(Debug, Error)]
pub enum UpstreamFailure {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("body is not a JSON array: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error("upstream collection '{collection}' unavailable: {source}")]
    UpstreamUnavailable {
        collection: Collection,
        #[source]
        source: UpstreamFailure,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl OrdersError {
    pub(crate) fn upstream(collection: Collection, source: impl Into<UpstreamFailure>) -> Self {
        Self::UpstreamUnavailable {
            collection,
            source: source.into(),
        }
    }

    /// True for failures that leave the last good snapshot in place.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, OrdersError>;
