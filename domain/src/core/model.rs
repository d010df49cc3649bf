//! Model value object identifying the chat model

use serde::{Deserialize, Serialize};

/// Identifier of a hosted chat model (Value Object)
///
/// Hosted inference providers address models by repository-style ids
/// such as `meta-llama/Llama-3.1-8B-Instruct`, so any non-empty string
/// is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(String);

impl Model {
    /// Model used when nothing is configured
    pub const DEFAULT_ID: &'static str = "meta-llama/Llama-3.1-8B-Instruct";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short name without the organisation prefix (`Llama-3.1-8B-Instruct`)
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::new(Self::DEFAULT_ID)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Model::new(s.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_default() {
        assert_eq!(Model::default().as_str(), Model::DEFAULT_ID);
    }

    #[test]
    fn test_short_name() {
        let model: Model = "mistralai/Mistral-7B-Instruct-v0.3".parse().unwrap();
        assert_eq!(model.short_name(), "Mistral-7B-Instruct-v0.3");

        let local = Model::new("llama3");
        assert_eq!(local.short_name(), "llama3");
    }

    #[test]
    fn test_model_serde_is_plain_string() {
        let model = Model::new("org/model");
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, "\"org/model\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
