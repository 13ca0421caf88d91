//! Query embedding with a small LRU cache.

use campanion_core::{EmbeddingRequest, Provider, ProviderError};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct QueryEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    dimensions: usize,
    cache: Option<Mutex<LruCache<String, Vec<f32>>>>,
}

impl QueryEmbedder {
    /// `cache_size` of 0 disables caching.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        dimensions: usize,
        cache_size: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions,
            cache: NonZeroUsize::new(cache_size).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Embed one query. The vector must have the configured dimension.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if let Some(hit) = self.cached(text) {
            debug!("Query embedding served from cache");
            return Ok(hit);
        }

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;

        let vector = response
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse("empty embedding".into()))?;

        if vector.len() != self.dimensions {
            return Err(ProviderError::MalformedResponse(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .put(text.to_string(), vector.clone());
        }

        Ok(vector)
    }

    fn cached(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(text)
            .cloned()
    }
}
