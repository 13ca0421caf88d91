//! Final answer generation.

use campanion_config::AppConfig;
use campanion_core::{Message, Provider, ProviderError, ProviderRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const GENERATION_FALLBACK: &str =
    "I encountered an error while generating the response. Please try again.";
pub const NO_CONTEXT: &str = "I couldn't find relevant information. Could you please rephrase your question or provide more details?";
pub const EMPTY_QUERY: &str =
    "Please type a question about courses, interviews, campus culture or social life.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// The model answered.
    Generated,
    /// The model failed; the text is an apology.
    Fallback,
    /// Nothing relevant was found and the model was not consulted.
    NoContext,
    /// The query was blank.
    EmptyQuery,
}

/// What the user gets back, plus why.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
    pub error: Option<ProviderError>,
}

impl Answer {
    pub fn fixed(kind: AnswerKind, text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind,
            error: None,
        }
    }
}

pub struct Responder {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Responder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.default_model.clone(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
        }
    }

    /// One completion. Failures become [`GENERATION_FALLBACK`]; no retry.
    pub async fn respond(&self, messages: Vec<Message>) -> Answer {
        let request = ProviderRequest::new(&self.model, messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        match self.provider.complete(request).await {
            Ok(response) if !response.message.content.trim().is_empty() => {
                debug!(
                    model = %response.model,
                    tokens = response.usage.as_ref().map(|u| u.total_tokens),
                    "Answer generated"
                );
                Answer {
                    text: response.message.content,
                    kind: AnswerKind::Generated,
                    error: None,
                }
            }
            Ok(_) => {
                warn!(provider = self.provider.name(), "Model returned an empty answer");
                Answer {
                    text: GENERATION_FALLBACK.to_string(),
                    kind: AnswerKind::Fallback,
                    error: Some(ProviderError::MalformedResponse("empty completion".into())),
                }
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Answer generation failed");
                Answer {
                    text: GENERATION_FALLBACK.to_string(),
                    kind: AnswerKind::Fallback,
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockProvider;

    #[tokio::test]
    async fn generated_answer_uses_configured_sampling() {
        let provider = Arc::new(MockProvider::new().with_completion("COL100 is required."));
        let responder = Responder::from_config(provider.clone(), &AppConfig::default());
        let answer = responder.respond(vec![Message::user("q")]).await;

        assert_eq!(answer.kind, AnswerKind::Generated);
        assert_eq!(answer.text, "COL100 is required.");
        let request = &provider.requests()[0];
        assert_eq!(request.model, "llama-3.1-8b-instant");
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn failure_becomes_fallback_with_error() {
        let provider = Arc::new(MockProvider::new().with_failure(ProviderError::RateLimited {
            retry_after_secs: 5,
        }));
        let answer = Responder::new(provider.clone(), "m").respond(vec![]).await;
        assert_eq!(answer.kind, AnswerKind::Fallback);
        assert_eq!(answer.text, GENERATION_FALLBACK);
        assert!(matches!(answer.error, Some(ProviderError::RateLimited { .. })));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn blank_completion_is_a_failure() {
        let provider = Arc::new(MockProvider::new().with_completion("   "));
        let answer = Responder::new(provider, "m").respond(vec![]).await;
        assert_eq!(answer.kind, AnswerKind::Fallback);
        assert!(matches!(answer.error, Some(ProviderError::MalformedResponse(_))));
    }
}
