//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST   /v1/chat`: Send a message, get the answer
//! - `DELETE /v1/sessions/{id}`: Forget a session

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use campanion_core::CourseCode;
use campanion_pipeline::{Chatbot, Session};

// ── State ─────────────────────────────────────────────────────────────────

/// Maximum number of in-memory sessions before the oldest is evicted.
const MAX_SESSIONS: usize = 1_000;
/// Longest accepted message, in characters.
const MAX_MESSAGE_CHARS: usize = 4_000;

struct SessionSlot {
    created_at: DateTime<Utc>,
    session: Arc<Mutex<Session>>,
}

/// Shared state for the v1 API.
///
/// Each session sits behind its own async mutex, so two requests for the
/// same session run one after the other while different sessions proceed
/// in parallel.
pub struct ApiV1State {
    pub chatbot: Arc<Chatbot>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

pub type SharedApiState = Arc<ApiV1State>;

impl ApiV1State {
    pub fn new(chatbot: Arc<Chatbot>) -> Self {
        Self {
            chatbot,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Fetch a session, creating it under `id` if it does not exist.
    async fn session(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(slot) = self.sessions.read().await.get(id) {
            return slot.session.clone();
        }

        let mut sessions = self.sessions.write().await;

        // Evict oldest session if at capacity
        if sessions.len() >= MAX_SESSIONS && !sessions.contains_key(id) {
            if let Some(oldest_key) = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.created_at)
                .map(|(k, _)| k.clone())
            {
                sessions.remove(&oldest_key);
            }
        }

        sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionSlot {
                created_at: Utc::now(),
                session: Arc::new(Mutex::new(Session::with_id(id))),
            })
            .session
            .clone()
    }

    async fn remove_session(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/sessions/{id}", delete(delete_session_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    /// Existing session ID (omit to start a new one).
    #[serde(default)]
    session_id: Option<String>,
    /// The user's message.
    message: String,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    session_id: String,
    response: String,
    degraded: bool,
    collections: Vec<String>,
    courses: Vec<CourseCode>,
    invalid_courses: Vec<CourseCode>,
}

#[derive(Serialize, Deserialize)]
struct SessionDeleteResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("message longer than {MAX_MESSAGE_CHARS} characters"),
            }),
        ));
    }

    let session_id = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(session = %session_id, message_len = payload.message.len(), "v1/chat request");

    let session = state.session(&session_id).await;
    let mut session = session.lock().await;
    let turn = state.chatbot.turn(&mut session, &payload.message).await;

    Ok(Json(ChatResponse {
        session_id,
        response: turn.answer.text,
        degraded: turn.degraded,
        collections: turn.collections,
        courses: turn.courses,
        invalid_courses: turn.invalid_courses,
    }))
}

async fn delete_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDeleteResponse>, (StatusCode, Json<SessionDeleteResponse>)> {
    if state.remove_session(&id).await {
        Ok(Json(SessionDeleteResponse {
            success: true,
            message: format!("Session '{id}' deleted"),
        }))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(SessionDeleteResponse {
                success: false,
                message: format!("Session '{id}' not found"),
            }),
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    use campanion_config::AppConfig;
    use campanion_core::{
        EmbeddingRequest, EmbeddingResponse, Message, Provider, ProviderError, ProviderRequest,
        ProviderResponse, ResponseFormat,
    };
    use campanion_pipeline::course_point_id;
    use campanion_store::InMemoryStore;

    /// Lightweight mock provider for gateway tests.
    ///
    /// Scores every collection low except `courses`, answers with a
    /// numbered reply so tests can count completions.
    struct MockProvider {
        answers: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let text = if request.response_format == ResponseFormat::JsonObject {
                r#"{"courses": 0.9, "interviews": 0.0, "culture": 0.0, "social": 0.0}"#.to_string()
            } else {
                let n = self.answers.fetch_add(1, Ordering::SeqCst) + 1;
                format!("answer {n} after {} messages", request.messages.len())
            };
            Ok(ProviderResponse {
                message: Message::assistant(text),
                usage: None,
                model: "mock-model".into(),
            })
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: request.inputs.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    pub(crate) async fn test_api_state() -> SharedApiState {
        let mut config = AppConfig::default();
        config.embedding.dimensions = 4;

        let store = InMemoryStore::new();
        for collection in config.collection_names() {
            store.create_collection(&collection).await;
        }
        let col100 = CourseCode::parse("COL100").unwrap();
        store
            .upsert(
                "courses",
                course_point_id(&col100),
                vec![1.0, 0.0, 0.0, 0.0],
                json!({"course_code": "COL100", "course_name": "Introduction to Computer Science"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await;

        let provider = Arc::new(MockProvider {
            answers: AtomicUsize::new(0),
        });
        let chatbot =
            Chatbot::new(&config, provider.clone(), provider, Arc::new(store)).unwrap();
        Arc::new(ApiV1State::new(Arc::new(chatbot)))
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn chat_creates_session_and_reports_courses() {
        let state = test_api_state().await;
        let app = v1_router(state.clone());

        let response = app
            .oneshot(chat_request(json!({"message": "Who teaches COL100 and ABC123?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: ChatResponse = read_json(response).await;
        assert!(!body.session_id.is_empty());
        assert!(body.response.starts_with("answer 1"));
        assert_eq!(body.collections, vec!["courses"]);
        assert_eq!(body.courses, vec![CourseCode::parse("COL100").unwrap()]);
        assert_eq!(body.invalid_courses, vec![CourseCode::parse("ABC123").unwrap()]);
        assert!(!body.degraded);
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn session_history_carries_over() {
        let state = test_api_state().await;

        let first: ChatResponse = read_json(
            v1_router(state.clone())
                .oneshot(chat_request(json!({"message": "credits for COL100?"})))
                .await
                .unwrap(),
        )
        .await;

        let second: ChatResponse = read_json(
            v1_router(state.clone())
                .oneshot(chat_request(json!({
                    "session_id": first.session_id,
                    "message": "and the instructor?"
                })))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(second.session_id, first.session_id);
        // system + two history turns + the new question
        assert!(second.response.ends_with("after 4 messages"));
        assert_eq!(state.session_count().await, 1);
    }

    #[tokio::test]
    async fn blank_message_gets_a_prompt() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(chat_request(json!({"message": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: ChatResponse = read_json(response).await;
        assert!(body.response.starts_with("Please type a question"));
        assert!(body.collections.is_empty());
    }

    #[tokio::test]
    async fn overlong_message_rejected() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(chat_request(json!({"message": "x".repeat(MAX_MESSAGE_CHARS + 1)})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_message_is_a_client_error() {
        let app = v1_router(test_api_state().await);
        let response = app
            .oneshot(chat_request(json!({"session_id": "abc"})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn delete_session() {
        let state = test_api_state().await;
        let created: ChatResponse = read_json(
            v1_router(state.clone())
                .oneshot(chat_request(json!({"session_id": "s-42", "message": "hi"})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(created.session_id, "s-42");

        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/sessions/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let response = v1_router(state.clone()).oneshot(delete("s-42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: SessionDeleteResponse = read_json(response).await;
        assert!(body.success);
        assert_eq!(state.session_count().await, 0);

        let response = v1_router(state).oneshot(delete("s-42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
