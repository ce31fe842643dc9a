//! Raw record shapes returned by the content backend's `/api/raw/{Type}`
//! listings. Only the fields the reconciler reads are modelled; anything
//! else on the wire is ignored.

use crate::types::Collection;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitlePart {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
}

/// A record reduced to its id and display title. Used for both
/// `OrderStatus` and `CustomerOrder` items.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTitledRecord {
    #[serde(rename = "ContentItemId", default)]
    pub content_item_id: Option<String>,
    #[serde(rename = "id", default)]
    pub legacy_id: Option<String>,
    #[serde(rename = "TitlePart", default)]
    pub title_part: Option<TitlePart>,
    #[serde(rename = "DisplayText", default)]
    pub display_text: Option<String>,
}

pub type RawStatusRecord = RawTitledRecord;
pub type RawCustomerOrderRecord = RawTitledRecord;

impl RawTitledRecord {
    pub fn id(&self) -> Option<&str> {
        resolve_id(self.content_item_id.as_deref(), self.legacy_id.as_deref())
    }

    /// `TitlePart.Title`, falling back to `DisplayText`.
    pub fn title(&self) -> Option<&str> {
        resolve_title(self.title_part.as_ref(), self.display_text.as_deref())
    }

    /// Id and title, or `None` when either is missing.
    pub fn entry(&self) -> Option<(&str, &str)> {
        Some((self.id()?, self.title()?))
    }
}

/// A content-picker field: a list of referenced item ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPicker {
    #[serde(rename = "ContentItemIds", default, deserialize_with = "lenient_ids")]
    pub content_item_ids: Vec<Option<String>>,
}

/// A picker value that is not an array (`null` included) references nothing;
/// non-string entries are kept as `None` so positions are preserved.
fn lenient_ids<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Option<String>>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Some(id),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl ContentPicker {
    pub fn first(&self) -> Option<&str> {
        self.content_item_ids.first()?.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlePart {
    #[serde(rename = "OrderStatus", default)]
    pub order_status: Option<ContentPicker>,
    #[serde(rename = "CustomerOrder", default)]
    pub customer_order: Option<ContentPicker>,
}

impl HandlePart {
    pub fn status_id(&self) -> Option<&str> {
        self.order_status.as_ref()?.first()
    }

    pub fn customer_order_id(&self) -> Option<&str> {
        self.customer_order.as_ref()?.first()
    }
}

/// Staff handling record linking a customer order to a status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHandleRecord {
    #[serde(rename = "ContentItemId", default)]
    pub content_item_id: Option<String>,
    #[serde(rename = "id", default)]
    pub legacy_id: Option<String>,
    #[serde(rename = "HandleOrder", default)]
    pub handle_order: Option<HandlePart>,
    #[serde(rename = "TitlePart", default)]
    pub title_part: Option<TitlePart>,
    #[serde(rename = "DisplayText", default)]
    pub display_text: Option<String>,
}

impl RawHandleRecord {
    pub fn id(&self) -> Option<&str> {
        resolve_id(self.content_item_id.as_deref(), self.legacy_id.as_deref())
    }

    pub fn title(&self) -> Option<&str> {
        resolve_title(self.title_part.as_ref(), self.display_text.as_deref())
    }
}

/// `ContentItemId` wins over the older `id` key; blank ids count as absent.
fn resolve_id<'a>(content_item_id: Option<&'a str>, legacy_id: Option<&'a str>) -> Option<&'a str> {
    let present = |id: &&str| !id.is_empty();
    content_item_id.filter(present).or(legacy_id.filter(present))
}

fn resolve_title<'a>(part: Option<&'a TitlePart>, display_text: Option<&'a str>) -> Option<&'a str> {
    part.and_then(|p| p.title.as_deref()).or(display_text)
}

/// Decode each element of a raw listing on its own, skipping elements that
/// do not fit the expected shape.
pub fn decode_records<T: DeserializeOwned>(collection: Collection, values: Vec<Value>) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if records.len() < total {
        tracing::debug!(
            collection = %collection,
            skipped = total - records.len(),
            "skipped malformed records"
        );
    }
    records
}
