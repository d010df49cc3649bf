//! Language model configuration from TOML (`[llm]` section)

use moviegraph_domain::Model;
use serde::{Deserialize, Serialize};

/// HuggingFace inference router, OpenAI-compatible
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Upper bound for `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Raw language model configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// Base URL of an OpenAI-compatible API (`/chat/completions` is appended)
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Bearer token
    #[serde(deserialize_with = "super::lenient_string")]
    pub api_token: Option<String>,
    /// Completion length limit
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout in seconds (0 disables it)
    pub timeout_secs: u64,
    /// Retries after a transient HTTP failure
    pub max_retries: u32,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: Model::DEFAULT_ID.to_string(),
            api_token: None,
            max_tokens: 1024,
            temperature: 0.1,
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

impl FileLlmConfig {
    pub fn parse_model(&self) -> Model {
        Model::new(self.model.trim())
    }
}
