//! Query routing and context assembly for Campanion.
//!
//! A turn flows through these stages, leaves first:
//! - [`extractor`] pulls course codes out of the query
//! - [`lookup`] fetches each course by its hashed point id
//! - [`classifier`] picks collections from keywords and model scores
//! - [`embedder`] and [`retrieval`] search the chosen collections
//! - [`assembler`] merges everything into a [`QueryContext`]
//! - [`prompt`] and [`responder`] turn that into an answer
//!
//! [`Chatbot`] wires the stages together; [`Session`] carries the state
//! that survives between turns.

pub mod assembler;
pub mod classifier;
pub mod embedder;
pub mod error;
pub mod extractor;
pub mod lookup;
pub mod pipeline;
pub mod prompt;
pub mod responder;
pub mod retrieval;
pub mod schedule;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assembler::{ContextAssembler, CourseSummary, QueryContext, StudyMaterial};
pub use classifier::{IntentClassifier, Routing, ScoreSource};
pub use error::PipelineError;
pub use extractor::CourseCodeExtractor;
pub use lookup::{course_point_id, CourseLookup, LookupOutcome};
pub use pipeline::{ChatTurn, Chatbot, RouteReport};
pub use responder::{Answer, AnswerKind};
pub use schedule::expand_days;
pub use session::Session;
