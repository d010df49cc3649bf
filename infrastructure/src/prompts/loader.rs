//! Local file system prompt loader

use moviegraph_domain::{DomainError, PromptTemplates};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while loading prompt templates
#[derive(Error, Debug)]
pub enum PromptLoadError {
    #[error("Cannot read prompt file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid prompt file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid prompt templates: {0}")]
    Invalid(#[from] DomainError),
}

/// Loads [`PromptTemplates`] once at startup.
pub struct PromptFileLoader;

impl PromptFileLoader {
    /// Load templates from `path`, or the built-in defaults when `None`.
    ///
    /// A configured file that cannot be read or parsed is an error; it never
    /// silently falls back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<PromptTemplates, PromptLoadError> {
        let templates = match path {
            Some(path) => Self::load_file(path)?,
            None => {
                debug!("Using built-in prompt templates");
                PromptTemplates::default()
            }
        };
        templates.validate()?;
        Ok(templates)
    }

    fn load_file(path: &Path) -> Result<PromptTemplates, PromptLoadError> {
        let content = fs::read_to_string(path).map_err(|source| PromptLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let templates = Self::parse(&content).map_err(|source| PromptLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded prompt templates from {}", path.display());
        Ok(templates)
    }

    /// Parse template overrides from TOML text
    pub fn parse(content: &str) -> Result<PromptTemplates, toml::de::Error> {
        toml::from_str(content)
    }
}
