//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application types
//! once validated.

mod graph;
mod llm;
mod logging;
mod prompts;
mod repl;
mod retrieval;

pub use graph::FileGraphConfig;
pub use llm::{DEFAULT_BASE_URL, FileLlmConfig, MAX_RETRIES_LIMIT};
pub use logging::FileLoggingConfig;
pub use prompts::FilePromptsConfig;
pub use repl::FileReplConfig;
pub use retrieval::FileRetrievalConfig;

use moviegraph_application::RetrievalParams;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat model endpoint
    pub llm: FileLlmConfig,
    /// Neo4j connection
    pub graph: FileGraphConfig,
    /// Retrieval loop control
    pub retrieval: FileRetrievalConfig,
    /// Prompt template overrides
    pub prompts: FilePromptsConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

/// How serious a configuration issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The value is suspicious but usable
    Warning,
    /// The application cannot start with this value
    Error,
}

/// One problem found by [`FileConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted key, e.g. `graph.uri`
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }

    fn missing(field: &'static str, env_hint: &str) -> Self {
        Self::error(
            field,
            format!("{field} is required (set it in a config file or via {env_hint})"),
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Any issue with [`Severity::Error`] must stop the application before
    /// the first question is read.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let required = [
            ("graph.uri", &self.graph.uri, "MOVIEGRAPH_GRAPH__URI or URI"),
            ("graph.username", &self.graph.username, "MOVIEGRAPH_GRAPH__USERNAME or USER"),
            ("graph.password", &self.graph.password, "MOVIEGRAPH_GRAPH__PASSWORD or PASSWORD"),
            ("graph.database", &self.graph.database, "MOVIEGRAPH_GRAPH__DATABASE or DB_NAME"),
            ("llm.api_token", &self.llm.api_token, "MOVIEGRAPH_LLM__API_TOKEN or HF_TOKEN"),
        ];
        for (field, value, env_hint) in required {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                issues.push(ConfigIssue::missing(field, env_hint));
            }
        }

        if self.llm.model.trim().is_empty() {
            issues.push(ConfigIssue::missing("llm.model", "MOVIEGRAPH_LLM__MODEL or MODEL"));
        }
        if self.llm.base_url.trim().is_empty() {
            issues.push(ConfigIssue::error("llm.base_url", "llm.base_url cannot be empty"));
        }
        if self.llm.max_tokens == 0 {
            issues.push(ConfigIssue::error("llm.max_tokens", "llm.max_tokens cannot be 0"));
        }
        if self.llm.max_retries > MAX_RETRIES_LIMIT {
            issues.push(ConfigIssue::error(
                "llm.max_retries",
                format!(
                    "llm.max_retries {} exceeds the limit of {}",
                    self.llm.max_retries, MAX_RETRIES_LIMIT
                ),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            issues.push(ConfigIssue::warning(
                "llm.temperature",
                format!(
                    "llm.temperature {} is outside the usual range 0.0-2.0",
                    self.llm.temperature
                ),
            ));
        }
        if self.graph.max_connections == 0 {
            issues.push(ConfigIssue::error(
                "graph.max_connections",
                "graph.max_connections cannot be 0",
            ));
        }
        if self.retrieval.max_rounds == 0 {
            issues.push(ConfigIssue::warning(
                "retrieval.max_rounds",
                "retrieval.max_rounds is 0: questions needing data will get the fallback answer",
            ));
        }
        if self.retrieval.fallback_answer.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "retrieval.fallback_answer",
                "retrieval.fallback_answer cannot be empty",
            ));
        }

        issues
    }

    /// Retrieval loop parameters derived from `[retrieval]`, `[llm]` and `[graph]`
    pub fn to_retrieval_params(&self) -> RetrievalParams {
        RetrievalParams::default()
            .with_max_rounds(self.retrieval.max_rounds)
            .with_parallel_queries(self.retrieval.parallel_queries)
            .with_fallback_answer(self.retrieval.fallback_answer.clone())
            .with_max_tokens(self.llm.max_tokens)
            .with_temperature(self.llm.temperature)
            .with_llm_timeout(seconds(self.llm.timeout_secs))
            .with_query_timeout(seconds(self.graph.query_timeout_secs))
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| "********".to_string());
        let mut config = self.clone();
        config.llm.api_token = mask(&self.llm.api_token);
        config.graph.password = mask(&self.graph.password);
        config
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Accept numbers and booleans where a string is expected.
///
/// Environment values are parsed leniently, so `PASSWORD=12345` arrives as
/// an integer.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
        Raw::Bool(b) => b.to_string(),
    }))
}
