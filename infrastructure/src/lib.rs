//! Infrastructure layer for moviegraph
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration and prompt file loading.

pub mod config;
pub mod logging;
pub mod neo4j;
pub mod prompts;
pub mod providers;

// Re-export commonly used types
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use logging::JsonlConversationLogger;
pub use neo4j::{Neo4jGraphStore, Neo4jSettings};
pub use prompts::{PromptFileLoader, PromptLoadError};
pub use providers::{ChatCompletionsConfig, ChatCompletionsError, ChatCompletionsGateway};
