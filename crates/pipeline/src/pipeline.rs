//! One chat turn, end to end.
//!
//! ```text
//! query ─┬─ extract codes ── lookup (session cache) ─┐
//!        ├─ classify ─┐                              ├─ assemble ── render ── respond
//!        └─ embed ────┴─ search collections ─────────┘
//! ```
//!
//! Every stage degrades instead of failing: the turn always produces an
//! answer, and [`ChatTurn::degraded`] says whether it is a reduced one.

use campanion_config::AppConfig;
use campanion_core::{CourseCode, Message, Provider, VectorStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use crate::assembler::ContextAssembler;
use crate::classifier::{IntentClassifier, Routing};
use crate::embedder::QueryEmbedder;
use crate::error::PipelineError;
use crate::extractor::CourseCodeExtractor;
use crate::lookup::CourseLookup;
use crate::prompt::PromptRenderer;
use crate::responder::{Answer, AnswerKind, Responder, EMPTY_QUERY, NO_CONTEXT};
use crate::retrieval::{CollectionHits, Retriever};
use crate::session::Session;

/// The outcome of one turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub answer: Answer,
    /// `None` when the query was blank.
    pub routing: Option<Routing>,
    /// Codes found in the catalogue
    pub courses: Vec<CourseCode>,
    /// Codes the catalogue does not contain
    pub invalid_courses: Vec<CourseCode>,
    /// Collections searched
    pub collections: Vec<String>,
    pub failed_collections: Vec<String>,
    /// Some part of the turn fell back to a reduced behavior.
    pub degraded: bool,
}

/// What the router would do with a query, without retrieving or answering.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub codes: Vec<CourseCode>,
    pub routing: Routing,
}

pub struct Chatbot {
    extractor: CourseCodeExtractor,
    classifier: IntentClassifier,
    embedder: QueryEmbedder,
    retriever: Retriever,
    assembler: ContextAssembler,
    renderer: PromptRenderer,
    responder: Responder,
}

impl Chatbot {
    /// Wire the pipeline from explicit backends.
    pub fn new(
        config: &AppConfig,
        completion: Arc<dyn Provider>,
        embedding: Arc<dyn Provider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let names = config.collection_names();
        for collection in [
            &config.retrieval.course_collection,
            &config.retrieval.interview_collection,
        ] {
            if !names.contains(collection) {
                return Err(PipelineError::UnknownCollection(collection.clone()));
            }
        }

        Ok(Self {
            extractor: CourseCodeExtractor::new()?,
            classifier: IntentClassifier::from_config(config, Some(completion.clone()))?,
            embedder: QueryEmbedder::new(
                embedding,
                &config.embedding.model,
                config.embedding.dimensions,
                config.embedding.cache_size,
            ),
            retriever: Retriever::from_config(store.clone(), config),
            assembler: ContextAssembler::new(
                CourseLookup::new(store, &config.retrieval.course_collection),
                config.schedule.abbreviation_mode,
            ),
            renderer: PromptRenderer::new(config.chat.persona.clone(), config.chat.history_turns),
            responder: Responder::from_config(completion, config),
        })
    }

    /// Wire the pipeline from configuration alone.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let router = campanion_providers::router::build_from_config(config);
        let completion = router
            .default()
            .ok_or_else(|| PipelineError::MissingProvider(config.default_provider.clone()))?;
        let embedding = router
            .embedder()
            .ok_or_else(|| PipelineError::MissingProvider(config.embedding.provider.clone()))?;
        let store = campanion_store::build_from_config(config)?;

        Self::new(config, completion, embedding, store)
    }

    /// Extract codes and classify, nothing more.
    pub async fn route(&self, query: &str) -> RouteReport {
        RouteReport {
            codes: self.extractor.extract(query),
            routing: self.classifier.classify(query).await,
        }
    }

    /// Answer one query within `session`, appending both turns to its history.
    pub async fn turn(&self, session: &mut Session, query: &str) -> ChatTurn {
        let query = query.trim();
        if query.is_empty() {
            return ChatTurn {
                answer: Answer::fixed(AnswerKind::EmptyQuery, EMPTY_QUERY),
                routing: None,
                courses: Vec::new(),
                invalid_courses: Vec::new(),
                collections: Vec::new(),
                failed_collections: Vec::new(),
                degraded: false,
            };
        }

        let RouteReport { codes, routing } = self.route(query).await;
        let resolved = self.assembler.resolve_courses(&codes, session).await;

        let searched = match self.embedder.embed(query).await {
            Ok(vector) => {
                let mut searched = self.retriever.search(&vector, &routing.collections).await;
                if !resolved.found.is_empty() {
                    searched.push(
                        self.retriever
                            .linked_interviews(&vector, &resolved.found_codes())
                            .await,
                    );
                }
                searched
            }
            Err(e) => {
                warn!(error = %e, "Query embedding failed, skipping retrieval");
                routing
                    .collections
                    .iter()
                    .map(|c| CollectionHits::failed(c, format!("embedding failed: {e}")))
                    .collect()
            }
        };

        let context = self
            .assembler
            .assemble(query, &resolved, searched, routing.collections.clone());

        let answer = if context.is_empty() && session.history.is_empty() {
            Answer::fixed(AnswerKind::NoContext, NO_CONTEXT)
        } else {
            let messages = self.renderer.render(&context, &session.history);
            self.responder.respond(messages).await
        };

        session.history.push(Message::user(query));
        session.history.push(Message::assistant(&answer.text));

        let degraded = answer.kind == AnswerKind::Fallback
            || routing.source.is_degraded()
            || !context.failed_collections.is_empty()
            || !context.unavailable_courses.is_empty();

        info!(
            session = %session.id,
            codes = codes.len(),
            collections = ?routing.collections,
            hits = context.hit_count(),
            cached_courses = session.cached_courses(),
            kind = ?answer.kind,
            degraded,
            "Turn complete"
        );

        ChatTurn {
            courses: resolved.found_codes(),
            invalid_courses: resolved.invalid,
            collections: routing.collections.clone(),
            failed_collections: context.failed_collections,
            routing: Some(routing),
            answer,
            degraded,
        }
    }
}
