//! In-memory backend: used by tests and offline runs.
//!
//! Collections can be seeded programmatically or from a JSON snapshot of
//! the shape `{"<collection>": [{"id": ..., "vector": [...], "payload": {...}}]}`.

use async_trait::async_trait;
use campanion_core::error::StoreError;
use campanion_core::store::{PayloadMap, PointRecord, ScoredPoint, SearchFilter, VectorStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::vector::{cosine_similarity, top_k};

/// A stored point.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredPoint {
    #[serde(deserialize_with = "crate::point_id")]
    pub id: String,
    #[serde(default)]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub payload: PayloadMap,
}

/// An in-memory vector store keyed by collection name.
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<StoredPoint>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load collections from a JSON snapshot file.
    pub fn from_snapshot(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Unavailable(format!("cannot read snapshot {}: {e}", path.display()))
        })?;
        let collections: HashMap<String, Vec<StoredPoint>> = serde_json::from_str(&content)
            .map_err(|e| {
                StoreError::InvalidResponse(format!("bad snapshot {}: {e}", path.display()))
            })?;

        tracing::info!(
            path = %path.display(),
            collections = collections.len(),
            "Loaded vector store snapshot"
        );

        Ok(Self {
            collections: Arc::new(RwLock::new(collections)),
        })
    }

    /// Create an empty collection (no-op if it exists).
    pub async fn create_collection(&self, name: &str) {
        self.collections
            .write()
            .await
            .entry(name.to_string())
            .or_default();
    }

    /// Insert or replace a point, creating the collection if needed.
    pub async fn upsert(
        &self,
        collection: &str,
        id: impl Into<String>,
        vector: Vec<f32>,
        payload: PayloadMap,
    ) {
        let id = id.into();
        let mut collections = self.collections.write().await;
        let points = collections.entry(collection.to_string()).or_default();
        points.retain(|p| p.id != id);
        points.push(StoredPoint { id, vector, payload });
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn retrieve(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<PointRecord>, StoreError> {
        let collections = self.collections.read().await;
        let points = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        Ok(ids
            .iter()
            .filter_map(|id| points.iter().find(|p| &p.id == id))
            .map(|p| PointRecord {
                id: p.id.clone(),
                payload: p.payload.clone(),
            })
            .collect())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let collections = self.collections.read().await;
        let points = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        if let Some(p) = points.iter().find(|p| p.vector.len() != vector.len()) {
            return Err(StoreError::DimensionMismatch {
                expected: p.vector.len(),
                actual: vector.len(),
            });
        }

        let candidates: Vec<&StoredPoint> = points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.payload)))
            .collect();
        let scores: Vec<f32> = candidates
            .iter()
            .map(|p| cosine_similarity(&p.vector, vector))
            .collect();

        Ok(top_k(&scores, limit)
            .into_iter()
            .map(|i| ScoredPoint {
                id: candidates[i].id.clone(),
                score: scores[i],
                payload: candidates[i].payload.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn payload(value: serde_json::Value) -> PayloadMap {
        value.as_object().cloned().unwrap()
    }

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .upsert("interviews", "a", vec![1.0, 0.0], payload(json!({"data": "COL106 heaps"})))
            .await;
        store
            .upsert("interviews", "b", vec![0.8, 0.6], payload(json!({"data": "system design"})))
            .await;
        store
            .upsert("interviews", "c", vec![0.0, 1.0], payload(json!({"data": "HR round"})))
            .await;
        store
    }

    #[tokio::test]
    async fn search_ranks_by_cosine() {
        let store = seeded().await;
        let hits = store.search("interviews", &[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "b");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn search_applies_filter() {
        let store = seeded().await;
        let filter = SearchFilter::text("data", "col106");
        let hits = store.search("interviews", &[0.0, 1.0], 5, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn unknown_collection_is_an_error() {
        let store = seeded().await;
        let err = store.search("alumni", &[1.0, 0.0], 5, None).await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound(_)));
        assert!(store.retrieve("alumni", &["a".into()]).await.is_err());
    }

    #[tokio::test]
    async fn dimension_mismatch_reported() {
        let store = seeded().await;
        let err = store.search("interviews", &[1.0, 0.0, 0.0], 5, None).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn retrieve_skips_unknown_ids_and_keeps_order() {
        let store = seeded().await;
        let ids = vec!["c".to_string(), "zzz".to_string(), "a".to_string()];
        let points = store.retrieve("interviews", &ids).await.unwrap();
        let got: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(got, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let store = seeded().await;
        store.upsert("interviews", "a", vec![0.0, 1.0], PayloadMap::new()).await;
        assert_eq!(store.len("interviews").await, 3);
        let hits = store.search("interviews", &[0.0, 1.0], 1, None).await.unwrap();
        assert!(["a", "c"].contains(&hits[0].id.as_str()));
    }

    #[tokio::test]
    async fn loads_snapshot_with_numeric_ids() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"culture": [
                {{"id": 7, "vector": [1.0, 0.0], "payload": {{"text": "House dinners"}}}},
                {{"id": "uuid-1", "vector": [0.0, 1.0]}}
            ]}}"#
        )
        .unwrap();

        let store = InMemoryStore::from_snapshot(file.path()).unwrap();
        assert_eq!(store.len("culture").await, 2);
        let points = store.retrieve("culture", &["7".into()]).await.unwrap();
        assert_eq!(points[0].payload["text"], "House dinners");
    }

    #[tokio::test]
    async fn snapshot_hex_digest_ids_match_hyphenated_lookups() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"courses": [
                {{"id": "994204ce761a7337223fd15989de72c7", "vector": [1.0, 0.0],
                  "payload": {{"course_code": "COL100"}}}}
            ]}}"#
        )
        .unwrap();

        let store = InMemoryStore::from_snapshot(file.path()).unwrap();
        let points = store
            .retrieve("courses", &["994204ce-761a-7337-223f-d15989de72c7".into()])
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].payload["course_code"], "COL100");
    }

    #[test]
    fn missing_snapshot_is_unavailable() {
        let err = InMemoryStore::from_snapshot(Path::new("/nonexistent.json")).err().unwrap();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
