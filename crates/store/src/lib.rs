//! Vector store backends for Campanion.
//!
//! All backends implement the `campanion_core::VectorStore` trait:
//! - [`QdrantStore`]: a Qdrant server over REST
//! - [`InMemoryStore`]: cosine search over in-process vectors

pub mod in_memory;
pub mod qdrant;
pub mod vector;

pub use in_memory::InMemoryStore;
pub use qdrant::QdrantStore;

use campanion_core::error::StoreError;
use campanion_core::store::VectorStore;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Build the configured backend.
pub fn build_from_config(
    config: &campanion_config::AppConfig,
) -> Result<Arc<dyn VectorStore>, StoreError> {
    let store = &config.vector_store;
    match store.backend.as_str() {
        "in_memory" => match &store.snapshot_path {
            Some(path) => Ok(Arc::new(InMemoryStore::from_snapshot(path)?)),
            None => Ok(Arc::new(InMemoryStore::new())),
        },
        "qdrant" => Ok(Arc::new(QdrantStore::new(
            &store.url,
            store.api_key.clone(),
            Duration::from_secs(store.timeout_secs),
        ))),
        other => Err(StoreError::Unavailable(format!("unknown backend '{other}'"))),
    }
}

/// Point ids are UUID strings or unsigned integers; both become strings.
/// UUIDs are rendered hyphenated, so a 32-digit hex digest and its
/// hyphenated form name the same point.
pub(crate) fn point_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => match Uuid::parse_str(&s) {
            Ok(uuid) => uuid.hyphenated().to_string(),
            Err(_) => s,
        },
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use campanion_config::AppConfig;

    #[test]
    fn default_config_builds_qdrant() {
        let store = build_from_config(&AppConfig::default()).unwrap();
        assert_eq!(store.name(), "qdrant");
    }

    #[test]
    fn in_memory_backend_without_snapshot() {
        let mut config = AppConfig::default();
        config.vector_store.backend = "in_memory".into();
        let store = build_from_config(&config).unwrap();
        assert_eq!(store.name(), "in_memory");
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.vector_store.backend = "pinecone".into();
        assert!(build_from_config(&config).is_err());
    }
}
