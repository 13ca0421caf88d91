//! Similarity search across the routed collections.
//!
//! Collections are searched concurrently (bounded) and independently: a
//! failing collection is reported and skipped, never allowed to sink the
//! others.

use campanion_config::AppConfig;
use campanion_core::{CourseCode, ScoredPoint, SearchFilter, VectorStore};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hits from one collection, already thresholded.
#[derive(Debug, Clone)]
pub struct CollectionHits {
    pub collection: String,
    pub hits: Vec<ScoredPoint>,
    /// Set when the search failed; `hits` is then empty.
    pub error: Option<String>,
}

impl CollectionHits {
    pub fn failed(collection: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            hits: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub struct Retriever {
    store: Arc<dyn VectorStore>,
    limit: usize,
    threshold: f32,
    max_concurrency: usize,
    linked_limit: usize,
    interview_collection: String,
    interview_field: String,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            limit: 5,
            threshold: 0.3,
            max_concurrency: 4,
            linked_limit: 2,
            interview_collection: "interviews".into(),
            interview_field: "data".into(),
        }
    }

    pub fn from_config(store: Arc<dyn VectorStore>, config: &AppConfig) -> Self {
        let retrieval = &config.retrieval;
        Self {
            store,
            limit: retrieval.search_limit,
            threshold: retrieval.score_threshold,
            max_concurrency: retrieval.max_concurrency.max(1),
            linked_limit: retrieval.linked_interview_limit,
            interview_collection: retrieval.interview_collection.clone(),
            interview_field: retrieval.interview_text_field.clone(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Search each collection and keep hits scoring strictly above the
    /// threshold. Results come back in the order `collections` was given.
    pub async fn search(&self, vector: &[f32], collections: &[String]) -> Vec<CollectionHits> {
        stream::iter(collections.to_vec())
            .map(|collection| async move {
                self.search_one(&collection, vector, self.limit, None).await
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Interview chunks that mention any of `codes`, deduplicated by id.
    pub async fn linked_interviews(
        &self,
        vector: &[f32],
        codes: &[CourseCode],
    ) -> CollectionHits {
        let mut linked = CollectionHits {
            collection: self.interview_collection.clone(),
            hits: Vec::new(),
            error: None,
        };
        if self.linked_limit == 0 {
            return linked;
        }

        let filters: Vec<SearchFilter> = codes
            .iter()
            .map(|code| SearchFilter::text(&self.interview_field, code.as_str()))
            .collect();

        let results: Vec<CollectionHits> = stream::iter(filters)
            .map(|filter| async move {
                self.search_one(&self.interview_collection, vector, self.linked_limit, Some(&filter))
                    .await
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut seen = HashSet::new();
        for result in results {
            if let Some(error) = result.error {
                linked.error.get_or_insert(error);
            }
            linked
                .hits
                .extend(result.hits.into_iter().filter(|h| seen.insert(h.id.clone())));
        }
        linked
    }

    async fn search_one(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> CollectionHits {
        match self.store.search(collection, vector, limit, filter).await {
            Ok(points) => {
                let total = points.len();
                let hits: Vec<ScoredPoint> =
                    points.into_iter().filter(|p| p.score > self.threshold).collect();
                debug!(collection, total, kept = hits.len(), "Collection searched");
                CollectionHits {
                    collection: collection.to_string(),
                    hits,
                    error: None,
                }
            }
            Err(e) => {
                warn!(collection, error = %e, "Collection search failed");
                CollectionHits::failed(collection, e.to_string())
            }
        }
    }
}
