//! Collection Envelope Assembler.
//!
//! Wraps a fully retrieved element list in the HAL-style collection shape
//! callers already know from OpenProject, plus `_retrieval_info` provenance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{BackendError, BackendResult};

/// Raw result of a full retrieval: every element plus the backend's total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionPage {
    pub elements: Vec<Value>,
    pub total: u64,
}

impl CollectionPage {
    pub fn new(elements: Vec<Value>, total: u64) -> Self {
        Self { elements, total }
    }

    /// Parse a single HAL collection page (`total` + `_embedded.elements`).
    pub fn from_hal(document: Value) -> BackendResult<Self> {
        let Value::Object(mut document) = document else {
            return Err(BackendError::invalid_response("collection is not an object"));
        };

        let elements = match document
            .get_mut("_embedded")
            .and_then(|embedded| embedded.get_mut("elements"))
            .map(Value::take)
        {
            Some(Value::Array(elements)) => elements,
            _ => {
                return Err(BackendError::invalid_response(
                    "collection has no _embedded.elements array",
                ));
            }
        };

        let total = document
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(elements.len() as u64);

        Ok(Self { elements, total })
    }
}

/// Retrieval mode reported in `_retrieval_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    FullRetrieval,
}

/// Provenance block attached to every collection response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalInfo {
    pub mode: RetrievalMode,
    pub total_retrieved: usize,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedded {
    pub elements: Vec<Value>,
}

/// Normalized collection response.
///
/// `count == pageSize == elements.len()` and `offset == 1` always hold.
/// `total` is the backend's figure and may differ from `count` when it was
/// stale at fetch time; that is reported, not corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEnvelope {
    #[serde(rename = "_type")]
    pub kind: String,
    pub total: u64,
    pub count: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    pub offset: u64,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded,
    #[serde(rename = "_retrieval_info")]
    pub retrieval_info: RetrievalInfo,
}

impl CollectionEnvelope {
    /// Build the envelope for a full retrieval of `label` (e.g. "work packages").
    pub fn assemble(page: CollectionPage, label: &str) -> Self {
        let count = page.elements.len();
        Self {
            kind: "Collection".to_string(),
            total: page.total,
            count,
            page_size: count,
            offset: 1,
            embedded: Embedded {
                elements: page.elements,
            },
            retrieval_info: RetrievalInfo {
                mode: RetrievalMode::FullRetrieval,
                total_retrieved: count,
                note: format!("All {} retrieved successfully", label),
            },
        }
    }

    pub fn elements(&self) -> &[Value] {
        &self.embedded.elements
    }

    /// Whether the backend's reported total matches what was retrieved.
    pub fn is_consistent(&self) -> bool {
        self.total == self.count as u64
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
