//! Errors raised while building the pipeline.
//!
//! Nothing a user types can produce these; at query time every failure
//! degrades to a smaller answer instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid keyword pattern for collection '{collection}': {pattern} ({reason})")]
    InvalidPattern {
        collection: String,
        pattern: String,
        reason: String,
    },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("No collections configured")]
    NoCollections,

    #[error("Provider not available: {0}")]
    MissingProvider(String),

    #[error("Course code pattern failed to compile: {0}")]
    CodePattern(#[from] regex_lite::Error),

    #[error(transparent)]
    Config(#[from] campanion_config::ConfigError),

    #[error(transparent)]
    Store(#[from] campanion_core::StoreError),
}
