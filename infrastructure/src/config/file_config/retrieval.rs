//! Retrieval loop configuration from TOML (`[retrieval]` section)

use moviegraph_application::config::retrieval_params::DEFAULT_FALLBACK_ANSWER;
use serde::{Deserialize, Serialize};

/// Raw retrieval configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetrievalConfig {
    /// Maximum number of query rounds per question
    pub max_rounds: usize,
    /// Run the queries of one round concurrently
    pub parallel_queries: bool,
    /// Answer given when no grounded answer was found
    pub fallback_answer: String,
}

impl Default for FileRetrievalConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            parallel_queries: false,
            fallback_answer: DEFAULT_FALLBACK_ANSWER.to_string(),
        }
    }
}
