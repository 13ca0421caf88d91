//! # Campanion Core
//!
//! Domain types, traits, and error definitions for the Campanion campus
//! assistant. This crate has **zero framework dependencies**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Boundaries
//!
//! The assistant talks to exactly two kinds of external service, and both are
//! defined here as traits:
//! - [`Provider`]: chat completions and text embeddings
//! - [`VectorStore`]: point retrieval and similarity search over collections
//!
//! Implementations live in `campanion-providers` and `campanion-store`, which
//! lets the pipeline be tested against scripted stand-ins.

pub mod course;
pub mod error;
pub mod message;
pub mod payload;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use course::{CourseCode, CourseRecord};
pub use error::{Error, ProviderError, Result, StoreError};
pub use message::{History, Message, Role};
pub use payload::{InterviewChunk, Payload, TextChunk};
pub use provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
    ResponseFormat, Usage,
};
pub use store::{FieldCondition, PointRecord, ScoredPoint, SearchFilter, VectorStore};
