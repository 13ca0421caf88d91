//! Hybrid intent classification over the configured collections.
//!
//! Two independent signals decide which collections a query is routed to:
//! keyword patterns (cheap, deterministic) and relevance scores from the
//! model. A collection is searched if either signal selects it, and every
//! collection is searched if neither does.

use campanion_config::AppConfig;
use campanion_core::{Message, Provider, ProviderRequest, ResponseFormat};
use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::error::PipelineError;

/// A collection with its compiled keyword patterns.
pub struct CollectionSpec {
    pub name: String,
    pub description: String,
    patterns: Vec<Regex>,
}

impl CollectionSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        keywords: &[String],
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        let patterns = keywords
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| PipelineError::InvalidPattern {
                    collection: name.clone(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            description: description.into(),
            patterns,
        })
    }

    /// Does any pattern match the (already lowercased) query?
    pub fn matches(&self, lowered: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(lowered))
    }
}

/// Where the relevance scores came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreSource {
    Model,
    /// Model scoring is switched off; keywords alone decide.
    Disabled,
    /// The model was asked but its answer was unusable.
    Default { reason: String },
}

impl ScoreSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ScoreSource::Default { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionScore {
    pub collection: String,
    pub score: f32,
}

/// The classifier's decision for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Routing {
    /// Collections to search, in configuration order. Never empty.
    pub collections: Vec<String>,
    pub keyword_matches: Vec<String>,
    pub scores: Vec<CollectionScore>,
    pub source: ScoreSource,
    /// True when nothing qualified and every collection was selected.
    pub fell_back: bool,
}

pub struct IntentClassifier {
    collections: Vec<CollectionSpec>,
    provider: Option<Arc<dyn Provider>>,
    model: String,
    threshold: f32,
    default_score: f32,
}

impl IntentClassifier {
    pub fn new(
        collections: Vec<CollectionSpec>,
        provider: Option<Arc<dyn Provider>>,
        model: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        if collections.is_empty() {
            return Err(PipelineError::NoCollections);
        }

        Ok(Self {
            collections,
            provider,
            model: model.into(),
            threshold: 0.3,
            default_score: 0.25,
        })
    }

    /// Build from configuration. `provider` is only used when
    /// `routing.use_llm` is set.
    pub fn from_config(
        config: &AppConfig,
        provider: Option<Arc<dyn Provider>>,
    ) -> Result<Self, PipelineError> {
        let collections = config
            .collections
            .iter()
            .map(|c| CollectionSpec::new(&c.name, &c.description, &c.keywords))
            .collect::<Result<Vec<_>, _>>()?;

        let model = config
            .routing
            .classifier_model
            .clone()
            .unwrap_or_else(|| config.default_model.clone());

        let provider = provider.filter(|_| config.routing.use_llm);

        Ok(Self::new(collections, provider, model)?
            .with_threshold(config.routing.relevance_threshold)
            .with_default_score(config.routing.default_score))
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_default_score(mut self, score: f32) -> Self {
        self.default_score = score;
        self
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.iter().map(|c| c.name.clone()).collect()
    }

    /// Collections whose keyword patterns match the query.
    pub fn keyword_matches(&self, query: &str) -> Vec<String> {
        let lowered = query.to_lowercase();
        self.collections
            .iter()
            .filter(|c| c.matches(&lowered))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Ask the model for per-collection scores.
    ///
    /// Falls back to the uniform default vector when the model is disabled
    /// or unreachable, or answers with something that is not a JSON object.
    pub async fn score(&self, query: &str) -> (Vec<f32>, ScoreSource) {
        let uniform = vec![self.default_score; self.collections.len()];

        let Some(provider) = &self.provider else {
            return (uniform, ScoreSource::Disabled);
        };

        let request = ProviderRequest::new(&self.model, self.scoring_messages(query))
            .with_temperature(0.0)
            .with_response_format(ResponseFormat::JsonObject);

        let reply = match provider.complete(request).await {
            Ok(response) => response.message.content,
            Err(e) => {
                warn!(error = %e, "Collection scoring failed, using default scores");
                return (uniform, ScoreSource::Default { reason: e.to_string() });
            }
        };

        match parse_scores(&reply, &self.collection_names(), self.default_score) {
            Ok(scores) => (scores, ScoreSource::Model),
            Err(reason) => {
                warn!(%reason, "Unusable collection scores, using default scores");
                (uniform, ScoreSource::Default { reason })
            }
        }
    }

    pub async fn classify(&self, query: &str) -> Routing {
        let keyword_matches = self.keyword_matches(query);
        let (scores, source) = self.score(query).await;

        let mut collections: Vec<String> = self
            .collections
            .iter()
            .zip(&scores)
            .filter(|(c, score)| keyword_matches.contains(&c.name) || **score > self.threshold)
            .map(|(c, _)| c.name.clone())
            .collect();

        let fell_back = collections.is_empty();
        if fell_back {
            collections = self.collection_names();
        }

        debug!(
            ?collections,
            ?keyword_matches,
            ?source,
            fell_back,
            "Query classified"
        );

        Routing {
            collections,
            keyword_matches,
            scores: self
                .collections
                .iter()
                .zip(scores)
                .map(|(c, score)| CollectionScore {
                    collection: c.name.clone(),
                    score,
                })
                .collect(),
            source,
            fell_back,
        }
    }

    fn scoring_messages(&self, query: &str) -> Vec<Message> {
        let listing: String = self
            .collections
            .iter()
            .map(|c| format!("- {}: {}\n", c.name, c.description))
            .collect();

        vec![
            Message::system(
                "You route questions for a campus assistant. Rate how relevant each \
                 collection is to the question with a number between 0 and 1. Reply with \
                 one JSON object that maps every collection name to its score, and nothing else.",
            ),
            Message::user(format!("Collections:\n{listing}\nQuestion: {query}")),
        ]
    }
}

/// Parse a model reply into one score per collection, in `names` order.
///
/// Accepts the object bare, wrapped in prose or code fences, or nested
/// under a `"scores"` key. Numbers are clamped to [0, 1]; numeric strings
/// are accepted; anything else (including NaN) becomes `default`.
pub fn parse_scores(raw: &str, names: &[String], default: f32) -> Result<Vec<f32>, String> {
    let start = raw.find('{').ok_or("no JSON object in reply")?;
    let end = raw.rfind('}').ok_or("no JSON object in reply")?;
    if end < start {
        return Err("no JSON object in reply".into());
    }

    let value: Value =
        serde_json::from_str(&raw[start..=end]).map_err(|e| format!("invalid JSON: {e}"))?;

    let object = match value.get("scores") {
        Some(Value::Object(inner)) => inner,
        _ => value.as_object().ok_or("reply is not a JSON object")?,
    };

    Ok(names
        .iter()
        .map(|name| {
            let score = match object.get(name) {
                Some(Value::Number(n)) => n.as_f64().map(|f| f as f32),
                Some(Value::String(s)) => s.trim().parse::<f32>().ok(),
                _ => None,
            };
            match score {
                Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
                _ => default,
            }
        })
        .collect())
}
