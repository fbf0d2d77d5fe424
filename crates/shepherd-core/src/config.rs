//! Configuration types for the shepherd pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration, resolved once at process start and read-only after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShepherdConfig {
    /// Model provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Article store configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Search and pipeline tuning.
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// OpenAI-compatible model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Overridden by OPENAI_API_KEY if set.
    #[serde(default)]
    pub api_key: String,

    /// Chat/completion model.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimension, fixed by the embedding model.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Deadline for embedding calls in seconds.
    #[serde(default = "default_short_timeout")]
    pub embed_timeout_secs: u64,

    /// Deadline for the enrichment completion call in seconds.
    #[serde(default = "default_short_timeout")]
    pub completion_timeout_secs: u64,

    /// Connect timeout for the streaming completion call in seconds.
    /// The stream itself is long-lived and carries no overall deadline.
    #[serde(default = "default_connect_timeout")]
    pub stream_connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            embed_timeout_secs: default_short_timeout(),
            completion_timeout_secs: default_short_timeout(),
            stream_connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Article store (REST contract) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store base URL.
    #[serde(default)]
    pub base_url: String,

    /// Service key. Overridden by SHEPHERD_STORE_KEY if set.
    #[serde(default)]
    pub service_key: String,

    /// Deadline for store lookup calls in seconds.
    #[serde(default = "default_short_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_key: String::new(),
            timeout_secs: default_short_timeout(),
        }
    }
}

/// Search and pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Similarity threshold for the conversational path (recall favors breadth).
    #[serde(default = "default_chat_threshold")]
    pub chat_match_threshold: f32,

    /// Similarity threshold for the standalone search path (favors precision).
    #[serde(default = "default_search_threshold")]
    pub search_match_threshold: f32,

    /// Cap on the merged result set.
    #[serde(default = "default_match_count")]
    pub match_count: u32,

    /// Cap on lexical substring-match results.
    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: u32,

    /// History turns included in the enrichment prompt.
    #[serde(default = "default_enrich_history")]
    pub enrich_history_turns: usize,

    /// History turns included in the answering call.
    #[serde(default = "default_answer_history")]
    pub answer_history_turns: usize,

    /// Enrichment sampling temperature (low, favoring determinism).
    #[serde(default = "default_enrich_temperature")]
    pub enrich_temperature: f32,

    /// Enrichment output token ceiling.
    #[serde(default = "default_enrich_max_tokens")]
    pub enrich_max_tokens: u32,

    /// Answering sampling temperature.
    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,

    /// Answering output token ceiling.
    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            chat_match_threshold: default_chat_threshold(),
            search_match_threshold: default_search_threshold(),
            match_count: default_match_count(),
            keyword_limit: default_keyword_limit(),
            enrich_history_turns: default_enrich_history(),
            answer_history_turns: default_answer_history(),
            enrich_temperature: default_enrich_temperature(),
            enrich_max_tokens: default_enrich_max_tokens(),
            answer_temperature: default_answer_temperature(),
            answer_max_tokens: default_answer_max_tokens(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

// Default value functions

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_short_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_chat_threshold() -> f32 {
    0.05
}

fn default_search_threshold() -> f32 {
    0.3
}

fn default_match_count() -> u32 {
    10
}

fn default_keyword_limit() -> u32 {
    5
}

fn default_enrich_history() -> usize {
    3
}

fn default_answer_history() -> usize {
    5
}

fn default_enrich_temperature() -> f32 {
    0.3
}

fn default_enrich_max_tokens() -> u32 {
    150
}

fn default_answer_temperature() -> f32 {
    0.7
}

fn default_answer_max_tokens() -> u32 {
    1000
}

fn default_bind_address() -> String {
    "0.0.0.0:8787".to_string()
}

impl ShepherdConfig {
    /// Load configuration from a file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::ShepherdError::config(format!("Failed to parse config: {}", e))
        })?;
        Ok(config)
    }

    /// Load configuration from default paths, then apply environment overrides.
    pub fn load_default() -> crate::error::Result<Self> {
        let mut config = Self::load_file_default()?;
        config.apply_env();
        Ok(config)
    }

    fn load_file_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("shepherd").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("shepherd.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Apply environment-variable overrides for secrets.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("SHEPHERD_STORE_URL") {
            self.store.base_url = url;
        }
        if let Ok(key) = std::env::var("SHEPHERD_STORE_KEY") {
            self.store.service_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShepherdConfig::default();
        assert_eq!(config.llm.embedding_dimension, 1536);
        assert_eq!(config.search.match_count, 10);
        assert_eq!(config.search.keyword_limit, 5);
    }

    #[test]
    fn test_thresholds_differ_by_path() {
        let config = SearchConfig::default();
        // Conversational recall favors breadth, standalone search precision.
        assert!(config.chat_match_threshold < config.search_match_threshold);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: ShepherdConfig = toml::from_str(
            r#"
            [llm]
            chat_model = "gpt-4o"

            [search]
            match_count = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.chat_model, "gpt-4o");
        assert_eq!(config.llm.embedding_model, "text-embedding-3-small");
        assert_eq!(config.search.match_count, 5);
        assert_eq!(config.search.keyword_limit, 5);
    }
}
