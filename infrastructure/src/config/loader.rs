//! Configuration loader with multi-source merging

use super::file_config::{ConfigIssue, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::Value,
};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["moviegraph.toml", ".moviegraph.toml"];

/// Flat variable file of the original deployment layout
const DOTENV_FILE: &str = ".env";

/// Prefix of structured environment overrides (`MOVIEGRAPH_GRAPH__URI`)
const ENV_PREFIX: &str = "MOVIEGRAPH_";

/// Flat variables of the `.env` deployment layout for the model endpoint
const LEGACY_LLM_ENV: [(&str, &str); 3] = [
    ("HF_TOKEN", "llm.api_token"),
    ("MODEL", "llm.model"),
    ("MAX_TOKENS", "llm.max_tokens"),
];

/// Flat variables of the `.env` deployment layout for the database.
///
/// Only honoured when `URI` is set, since `USER` is also the login name.
const LEGACY_GRAPH_ENV: [(&str, &str); 4] = [
    ("URI", "graph.uri"),
    ("USER", "graph.username"),
    ("PASSWORD", "graph.password"),
    ("DB_NAME", "graph.database"),
];

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration:\n{}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `MOVIEGRAPH_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./moviegraph.toml` or `./.moviegraph.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/moviegraph/config.toml`
    /// 5. Flat variables (`HF_TOKEN`, `MODEL`, `URI`, ...) from the process
    ///    environment, then from a `.env` file
    /// 6. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        Self::figment(config_path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Split issues of an already loaded config into fatal and warnings.
    pub fn check(config: FileConfig) -> Result<(FileConfig, Vec<ConfigIssue>), ConfigError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            config.validate().into_iter().partition(|issue| issue.is_error());
        if errors.is_empty() {
            Ok((config, warnings))
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Load defaults and environment variables only (for --no-config)
    pub fn load_env_only() -> Result<FileConfig, ConfigError> {
        Self::base(&[])
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Defaults overlaid with the flat variables, process environment over `dotenv`
    fn base(dotenv: &[(String, String)]) -> Figment {
        let figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Self::legacy_dotenv(dotenv, &LEGACY_LLM_ENV))
            .merge(Self::legacy_env(&LEGACY_LLM_ENV));

        let has_uri = std::env::var_os("URI").is_some()
            || dotenv.iter().any(|(key, _)| key.eq_ignore_ascii_case("URI"));
        if has_uri {
            figment
                .merge(Self::legacy_dotenv(dotenv, &LEGACY_GRAPH_ENV))
                .merge(Self::legacy_env(&LEGACY_GRAPH_ENV))
        } else {
            figment
        }
    }

    /// Entries of the nearest `.env` file, without touching the process environment
    fn read_dotenv() -> Vec<(String, String)> {
        let Ok(entries) = dotenvy::from_filename_iter(DOTENV_FILE) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| match entry {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!("Skipping malformed {} entry: {}", DOTENV_FILE, e);
                    None
                }
            })
            .collect()
    }

    /// The merged provider chain, without extracting it
    pub fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Self::base(&Self::read_dotenv());

        // Add global config (XDG or fallback)
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        // Add explicit config path (highest priority for files)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn legacy_env(mapping: &'static [(&'static str, &'static str)]) -> Env {
        Env::raw().filter_map(move |key| {
            mapping
                .iter()
                .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                .map(|(_, path)| (*path).into())
        })
    }

    fn legacy_dotenv(
        entries: &[(String, String)],
        mapping: &'static [(&'static str, &'static str)],
    ) -> Figment {
        entries
            .iter()
            .filter_map(|(key, value)| {
                mapping
                    .iter()
                    .find(|(name, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, path)| (*path, value))
            })
            .fold(Figment::new(), |figment, (path, value)| {
                let value = value
                    .parse::<Value>()
                    .unwrap_or_else(|_| Value::from(value.clone()));
                figment.merge(Serialized::default(path, value))
            })
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/moviegraph/config.toml if set,
    /// otherwise falls back to ~/.config/moviegraph/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("moviegraph").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for --show-config)
    pub fn describe_sources(config_path: Option<&PathBuf>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        lines.push(format!("  [ENV  ] {}* environment variables", ENV_PREFIX));

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISS " };
            lines.push(format!("  [{mark}] Explicit: {}", path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push(format!(
                "  [     ] Project: ./{} or ./{}",
                PROJECT_FILES[0], PROJECT_FILES[1]
            )),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{mark}] Global:  {}", path.display()));
        }

        lines.push("  [ENV  ] HF_TOKEN, MODEL, MAX_TOKENS, URI, USER, PASSWORD, DB_NAME".into());
        let mark = if std::path::Path::new(DOTENV_FILE).exists() {
            "FOUND"
        } else {
            "     "
        };
        lines.push(format!("  [{mark}] Dotenv:  ./{DOTENV_FILE}"));
        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}
