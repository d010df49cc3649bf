//! Configuration loading for moviegraph
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MOVIEGRAPH_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./moviegraph.toml` or `./.moviegraph.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/moviegraph/config.toml`
//! 5. Flat `.env` style variables (`HF_TOKEN`, `URI`, ...)
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, DEFAULT_BASE_URL, FileConfig, FileGraphConfig, FileLlmConfig,
    FileLoggingConfig, FilePromptsConfig, FileReplConfig, FileRetrievalConfig, Severity,
};
pub use loader::{ConfigError, ConfigLoader};
