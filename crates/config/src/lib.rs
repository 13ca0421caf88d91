//! Configuration loading, validation, and management for Campanion.
//!
//! Loads configuration from `~/.campanion/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.campanion/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for answers
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per answer
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Vector database connection
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Query embedding settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Intent classification settings
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Similarity search settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Topical collections, each backed by its own vector index
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,

    /// Conversation settings
    #[serde(default)]
    pub chat: ChatConfig,

    /// Schedule rendering
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// HTTP surface
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("vector_store", &self.vector_store)
            .field("embedding", &self.embedding)
            .field("routing", &self.routing)
            .field("retrieval", &self.retrieval)
            .field("collections", &self.collections)
            .field("chat", &self.chat)
            .field("schedule", &self.schedule)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for VectorStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .field("snapshot_path", &self.snapshot_path)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// "qdrant" or "in_memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,

    /// JSON snapshot loaded by the in-memory backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

fn default_store_backend() -> String {
    "qdrant".into()
}
fn default_store_url() -> String {
    "http://localhost:6333".into()
}
fn default_store_timeout() -> u64 {
    30
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_store_url(),
            api_key: None,
            timeout_secs: default_store_timeout(),
            snapshot_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider serving `/embeddings` (a key into `providers` or a known name)
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector length; must match the ingested collections
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// LRU capacity for query embeddings (0 disables the cache)
    #[serde(default = "default_embedding_cache")]
    pub cache_size: usize,
}

fn default_embedding_provider() -> String {
    "ollama".into()
}
fn default_embedding_model() -> String {
    "all-minilm".into()
}
fn default_embedding_dimensions() -> usize {
    384
}
fn default_embedding_cache() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            cache_size: default_embedding_cache(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Ask the model to score collections (keywords alone when false)
    #[serde(default = "default_true")]
    pub use_llm: bool,

    /// Model used for scoring; falls back to `default_model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_model: Option<String>,

    /// A collection is relevant when its score is strictly above this
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Score assumed for missing or malformed values
    #[serde(default = "default_score")]
    pub default_score: f32,
}

fn default_relevance_threshold() -> f32 {
    0.3
}
fn default_score() -> f32 {
    0.25
}
fn default_true() -> bool {
    true
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            use_llm: true,
            classifier_model: None,
            relevance_threshold: default_relevance_threshold(),
            default_score: default_score(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Result cap per collection search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Hits must score strictly above this to be kept
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Max collection searches in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Extra interview hits per resolved course (0 disables)
    #[serde(default = "default_linked_interview_limit")]
    pub linked_interview_limit: usize,

    /// Collection holding course records addressed by hashed code
    #[serde(default = "default_course_collection")]
    pub course_collection: String,

    /// Collection searched for course-linked interviews
    #[serde(default = "default_interview_collection")]
    pub interview_collection: String,

    /// Payload field the course-linked interview filter matches on
    #[serde(default = "default_interview_text_field")]
    pub interview_text_field: String,
}

fn default_search_limit() -> usize {
    5
}
fn default_score_threshold() -> f32 {
    0.3
}
fn default_max_concurrency() -> usize {
    4
}
fn default_linked_interview_limit() -> usize {
    2
}
fn default_course_collection() -> String {
    "courses".into()
}
fn default_interview_collection() -> String {
    "interviews".into()
}
fn default_interview_text_field() -> String {
    "data".into()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            score_threshold: default_score_threshold(),
            max_concurrency: default_max_concurrency(),
            linked_interview_limit: default_linked_interview_limit(),
            course_collection: default_course_collection(),
            interview_collection: default_interview_collection(),
            interview_text_field: default_interview_text_field(),
        }
    }
}

/// One topical collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,

    /// Shown to the scoring model
    #[serde(default)]
    pub description: String,

    /// Regex patterns tried against the lowercased query
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CollectionConfig {
    fn new(name: &str, description: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            keywords: keywords.iter().map(|k| (*k).into()).collect(),
        }
    }
}

fn default_collections() -> Vec<CollectionConfig> {
    vec![
        CollectionConfig::new(
            "courses",
            "Course catalogue: names, credits, prerequisites, overlaps, instructors, slots, schedules, descriptions and study materials",
            &[
                r"\b(courses?|credits?|prereq\w*|pre-requisites?|overlaps?|instructors?|professors?|prof|slots?|lectures?|tutorials?|syllabus|electives?|study materials?)\b",
                r"\b[a-z]{2,3}[\s-]?\d{3}\b",
            ],
        ),
        CollectionConfig::new(
            "interviews",
            "Interview and internship experiences shared by seniors: companies, rounds, questions, preparation",
            &[r"\b(interview\w*|internships?|intern|placements?|recruit\w*|resume|cv|compan(y|ies)|ppo|hiring)\b"],
        ),
        CollectionConfig::new(
            "culture",
            "Campus culture: traditions, fests, hostels, houses, mess, clubs, societies, orientation and Inception",
            &[r"\b(culture|traditions?|fests?|hostels?|houses?|mess|clubs?|societ(y|ies)|freshers?|orientation|inception)\b"],
        ),
        CollectionConfig::new(
            "social",
            "Social life: making friends, parties, hangouts, events, meetups, communities and United",
            &[r"\b(friends?|social|part(y|ies)|hangouts?|events?|meet\w*|groups?|communit(y|ies)|united)\b"],
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// History turns rendered into each prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Delay between words when pacing output (0 = print at once)
    #[serde(default = "default_stream_delay_ms")]
    pub stream_delay_ms: u64,

    /// Replace the built-in persona/style block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

fn default_history_turns() -> usize {
    6
}
fn default_stream_delay_ms() -> u64 {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_turns: default_history_turns(),
            stream_delay_ms: default_stream_delay_ms(),
            persona: None,
        }
    }
}

/// How day abbreviations in schedule strings are expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbbreviationMode {
    /// Only whole tokens ("Th" but not the "Th" in "Thermo")
    #[default]
    Token,
    /// Every literal occurrence, as the first release did
    Substring,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub abbreviation_mode: AbbreviationMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8686
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Environment variable overrides (highest priority).
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("CAMPANION_API_KEY")
                .or_else(|| lookup("GROQ_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("CAMPANION_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("CAMPANION_MODEL") {
            self.default_model = model;
        }

        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }

        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs_home().join(".campanion")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        for (name, value) in [
            ("routing.relevance_threshold", self.routing.relevance_threshold),
            ("routing.default_score", self.routing.default_score),
            ("retrieval.score_threshold", self.retrieval.score_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }

        if self.retrieval.search_limit == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.search_limit must be > 0".into(),
            ));
        }

        if self.retrieval.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_concurrency must be > 0".into(),
            ));
        }

        if !matches!(self.vector_store.backend.as_str(), "qdrant" | "in_memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown vector_store.backend '{}' (expected \"qdrant\" or \"in_memory\")",
                self.vector_store.backend
            )));
        }

        if self.collections.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[collections]] entry is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if collection.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "collection names must not be empty".into(),
                ));
            }
            if !seen.insert(collection.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate collection '{}'",
                    collection.name
                )));
            }
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.iter().map(|c| c.name.clone()).collect()
    }

    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            vector_store: VectorStoreConfig::default(),
            embedding: EmbeddingConfig::default(),
            routing: RoutingConfig::default(),
            retrieval: RetrievalConfig::default(),
            collections: default_collections(),
            chat: ChatConfig::default(),
            schedule: ScheduleConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
