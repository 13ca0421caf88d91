//! Vector store trait: point retrieval and similarity search.
//!
//! Each topical collection (courses, interviews, ...) lives in its own
//! named index. The assistant never writes to the store; records are
//! created offline by ingestion scripts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

/// Raw payload attached to a stored point.
pub type PayloadMap = serde_json::Map<String, serde_json::Value>;

/// A point fetched by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    /// Point id as reported by the store
    pub id: String,

    /// Attached payload (may be empty)
    #[serde(default)]
    pub payload: PayloadMap,
}

/// A point returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// Point id as reported by the store
    pub id: String,

    /// Similarity to the query vector (cosine, 0.0–1.0 for normalized vectors)
    pub score: f32,

    /// Attached payload
    #[serde(default)]
    pub payload: PayloadMap,
}

/// A payload condition that every search hit must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldCondition {
    /// Field equals the value exactly
    Exact { key: String, value: String },
    /// Field contains the value as text
    Text { key: String, value: String },
}

impl FieldCondition {
    pub fn key(&self) -> &str {
        match self {
            FieldCondition::Exact { key, .. } | FieldCondition::Text { key, .. } => key,
        }
    }

    /// Evaluate against a payload (used by stores without native filtering).
    pub fn matches(&self, payload: &PayloadMap) -> bool {
        let Some(field) = payload.get(self.key()).and_then(|v| v.as_str()) else {
            return false;
        };
        match self {
            FieldCondition::Exact { value, .. } => field == value,
            FieldCondition::Text { value, .. } => {
                field.to_lowercase().contains(&value.to_lowercase())
            }
        }
    }
}

/// Conjunction of payload conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub must: Vec<FieldCondition>,
}

impl SearchFilter {
    /// A filter requiring `key` to contain `value` as text.
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            must: vec![FieldCondition::Text {
                key: key.into(),
                value: value.into(),
            }],
        }
    }

    pub fn matches(&self, payload: &PayloadMap) -> bool {
        self.must.iter().all(|c| c.matches(payload))
    }
}

/// The core VectorStore trait.
///
/// Implementations: Qdrant (REST), in-memory (testing / offline).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "qdrant", "in_memory").
    fn name(&self) -> &str;

    /// Fetch points by id. Unknown ids are silently absent from the result.
    async fn retrieve(
        &self,
        collection: &str,
        ids: &[String],
    ) -> std::result::Result<Vec<PointRecord>, StoreError>;

    /// Return up to `limit` points most similar to `vector`, best first.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> std::result::Result<Vec<ScoredPoint>, StoreError>;

    /// Health check: can we reach the store?
    async fn health_check(&self) -> std::result::Result<bool, StoreError> {
        Ok(true)
    }
}
