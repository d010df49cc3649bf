//! Prompt template configuration from TOML (`[prompts]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw prompt configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePromptsConfig {
    /// TOML file overriding the built-in templates
    pub path: Option<PathBuf>,
}
