//! Qdrant vector store backend over the REST API.
//!
//! Only the two read endpoints the assistant needs are used:
//! - `POST /collections/{name}/points`: fetch points by id
//! - `POST /collections/{name}/points/search`: similarity search
//!
//! Collections are created and filled offline by the ingestion scripts.

use async_trait::async_trait;
use campanion_core::error::StoreError;
use campanion_core::store::{
    FieldCondition, PayloadMap, PointRecord, ScoredPoint, SearchFilter, VectorStore,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// A [`VectorStore`] backed by a Qdrant server.
pub struct QdrantStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl QdrantStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url).header("Content-Type", "application/json");
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        collection: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, collection, body = %error_body, "Qdrant returned error");
            return Err(StoreError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let envelope: QdrantEnvelope<T> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(envelope.result)
    }
}

/// Render a filter in Qdrant's `must` clause syntax.
fn filter_json(filter: &SearchFilter) -> serde_json::Value {
    let must: Vec<serde_json::Value> = filter
        .must
        .iter()
        .map(|condition| match condition {
            FieldCondition::Exact { key, value } => {
                serde_json::json!({ "key": key, "match": { "value": value } })
            }
            FieldCondition::Text { key, value } => {
                serde_json::json!({ "key": key, "match": { "text": value } })
            }
        })
        .collect();
    serde_json::json!({ "must": must })
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn retrieve(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<PointRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/collections/{collection}/points", self.base_url);
        let body = serde_json::json!({
            "ids": ids,
            "with_payload": true,
            "with_vector": false,
        });

        debug!(collection, count = ids.len(), "Retrieving points");

        let points: Vec<ApiPoint> = self.send(collection, self.post(&url).json(&body)).await?;

        Ok(points
            .into_iter()
            .map(|p| PointRecord {
                id: p.id,
                payload: p.payload.unwrap_or_default(),
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
        let url = format!("{}/collections/{collection}/points/search", self.base_url);
        let mut body = serde_json::json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });

        if let Some(filter) = filter.filter(|f| !f.must.is_empty()) {
            body["filter"] = filter_json(filter);
        }

        debug!(collection, limit, filtered = filter.is_some(), "Searching collection");

        let hits: Vec<ApiScoredPoint> = self.send(collection, self.post(&url).json(&body)).await?;

        Ok(hits
            .into_iter()
            .map(|h| ScoredPoint {
                id: h.id,
                score: h.score,
                payload: h.payload.unwrap_or_default(),
            })
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}/healthz", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

// --- Qdrant API types (internal) ---

#[derive(Debug, Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ApiPoint {
    #[serde(deserialize_with = "crate::point_id")]
    id: String,
    #[serde(default)]
    payload: Option<PayloadMap>,
}

#[derive(Debug, Deserialize)]
struct ApiScoredPoint {
    #[serde(deserialize_with = "crate::point_id")]
    id: String,
    score: f32,
    #[serde(default)]
    payload: Option<PayloadMap>,
}
