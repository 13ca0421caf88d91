//! Shared fixtures for pipeline tests.

use async_trait::async_trait;
use campanion_core::store::{PayloadMap, PointRecord, ScoredPoint, SearchFilter};
use campanion_core::{
    CourseCode, EmbeddingRequest, EmbeddingResponse, Message, Provider, ProviderError,
    ProviderRequest, ProviderResponse, StoreError, Usage, VectorStore,
};
use campanion_store::InMemoryStore;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::lookup::course_point_id;

/// The query vector returned by [`MockProvider::with_embedding`] in most tests.
pub const QUERY_VECTOR: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// A provider that replays scripted completions and records every request.
///
/// Completions are consumed in order; once the script runs out, further
/// calls fail with a network error.
pub struct MockProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    embedding: Option<Vec<f32>>,
    embed_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            embedding: None,
            embed_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_completion(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn with_failure(self, error: ProviderError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_embedding(mut self, vector: &[f32]) -> Self {
        self.embedding = Some(vector.to_vec());
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())));

        next.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        let vector = self
            .embedding
            .clone()
            .ok_or_else(|| ProviderError::NotConfigured("mock has no embedding".into()))?;

        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|_| vector.clone()).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// A store that fails for some (or all) collections and otherwise
/// delegates to an inner in-memory store.
pub struct FailingStore {
    inner: Option<Arc<InMemoryStore>>,
    failing: Option<HashSet<String>>,
}

impl FailingStore {
    /// Every call fails.
    pub fn everywhere() -> Self {
        Self {
            inner: None,
            failing: None,
        }
    }

    /// Calls against `collections` fail; the rest reach `inner`.
    pub fn for_collections(inner: Arc<InMemoryStore>, collections: &[&str]) -> Self {
        Self {
            inner: Some(inner),
            failing: Some(collections.iter().map(|c| c.to_string()).collect()),
        }
    }

    fn target(&self, collection: &str) -> Result<&InMemoryStore, StoreError> {
        let fails = self.failing.as_ref().is_none_or(|set| set.contains(collection));
        match (&self.inner, fails) {
            (Some(inner), false) => Ok(inner),
            _ => Err(StoreError::Unavailable(format!("{collection}: connection refused"))),
        }
    }
}

#[async_trait]
impl VectorStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn retrieve(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<PointRecord>, StoreError> {
        self.target(collection)?.retrieve(collection, ids).await
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        self.target(collection)?
            .search(collection, vector, limit, filter)
            .await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(false)
    }
}

pub fn payload(value: Value) -> PayloadMap {
    value.as_object().cloned().unwrap()
}

fn code(raw: &str) -> CourseCode {
    CourseCode::parse(raw).unwrap()
}

/// A store seeded like a small production deployment.
///
/// Against [`QUERY_VECTOR`]: the COL106 interview scores 1.0, the culture
/// write-up 0.6, the other interview and the social post fall below the
/// default 0.3 threshold.
pub async fn course_store() -> Arc<InMemoryStore> {
    let store = InMemoryStore::new();

    store
        .upsert(
            "courses",
            course_point_id(&code("COL100")),
            vec![0.9, 0.1, 0.0, 0.0],
            payload(json!({
                "course_code": "COL100",
                "course_name": "Introduction to Computer Science",
                "instructor": "Prof. A. Kumar",
                "credits": 4,
                "units": "3-0-2",
                "slot": "A",
                "lec_time": "M Th 8:00-9:30",
                "study_material": ["https://example.edu/col100/notes"],
            })),
        )
        .await;

    store
        .upsert(
            "courses",
            course_point_id(&code("COL106")),
            vec![0.8, 0.2, 0.0, 0.0],
            payload(json!({
                "course_code": "COL106",
                "course_name": "Data Structures and Algorithms",
                "instructor": "Prof. R. Sen",
                "instructor_email": "rsen@example.edu",
                "credits": "5",
                "prereqs": ["COL100"],
                "overlaps": "COL206",
                "slot": "B",
                "lec_time": "Tu F 9:30-11:00",
                "tut_time": "W 1:00-2:00",
                "description": "Lists, trees, heaps, graphs.",
                "vacancy": 12,
            })),
        )
        .await;

    store
        .upsert(
            "interviews",
            "i-1",
            vec![1.0, 0.0, 0.0, 0.0],
            payload(json!({
                "interviewee": "Riya",
                "company": "Google",
                "data": "Questions came straight from COL106: heaps and BFS.",
            })),
        )
        .await;

    store
        .upsert(
            "interviews",
            "i-2",
            vec![0.2, 0.98, 0.0, 0.0],
            payload(json!({
                "interviewee": "Arjun",
                "company": "Jane Street",
                "data": "Mostly probability puzzles.",
            })),
        )
        .await;

    store
        .upsert(
            "culture",
            "c-1",
            vec![0.6, 0.8, 0.0, 0.0],
            payload(json!({"text": "Every hostel hosts a dinner during Inception.", "source": "culture-guide"})),
        )
        .await;

    store
        .upsert(
            "social",
            "s-1",
            vec![0.0, 0.0, 1.0, 0.0],
            payload(json!({"text": "United meets every Friday."})),
        )
        .await;

    Arc::new(store)
}
