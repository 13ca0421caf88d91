//! Provider router: selects the correct LLM provider based on config.
//!
//! Handles provider creation and routing requests to the right backend.
//! Completions and embeddings may be served by different providers
//! (e.g. Groq for chat, a local Ollama for `all-minilm` embeddings).

use std::collections::HashMap;
use std::sync::Arc;
use campanion_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
    embedding_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        let default_provider = default_provider.into();
        Self {
            providers: HashMap::new(),
            embedding_provider: default_provider.clone(),
            default_provider,
        }
    }

    /// Serve embeddings from `name` instead of the default provider.
    pub fn with_embedding_provider(mut self, name: impl Into<String>) -> Self {
        self.embedding_provider = name.into();
        self
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default (completion) provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get the provider serving embeddings.
    pub fn embedder(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.embedding_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &campanion_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider)
        .with_embedding_provider(&config.embedding.provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| shared_key(config, name))
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    // Ensure the default and embedding providers exist (even if not explicitly configured)
    for name in [&config.default_provider, &config.embedding.provider] {
        if router.get(name).is_none() {
            let api_key = shared_key(config, name).unwrap_or_default();
            let base_url = default_base_url(name);
            router.register(
                name.clone(),
                Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
            );
        }
    }

    router
}

/// The top-level key belongs to the completion provider; local servers
/// get a placeholder.
fn shared_key(config: &campanion_config::AppConfig, name: &str) -> Option<String> {
    if name == config.default_provider {
        config.api_key.clone()
    } else if is_local(name) {
        Some(name.to_string())
    } else {
        None
    }
}

/// Local servers need no API key.
pub fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
