//! Retrieval parameters: use case loop control.
//!
//! [`RetrievalParams`] groups the static parameters that control the
//! loop in [`RetrievalLoopUseCase`](crate::use_cases::retrieval_loop::RetrievalLoopUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Answer given when the loop stops without a grounded answer
pub const DEFAULT_FALLBACK_ANSWER: &str =
    "I'm sorry, I was unable to find an answer to that question in the movie database.";

/// Retrieval loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Maximum number of query rounds per question.
    pub max_rounds: usize,
    /// Run the candidate queries of one round concurrently.
    pub parallel_queries: bool,
    /// Timeout for each model call.
    pub llm_timeout: Option<Duration>,
    /// Timeout for each graph query.
    pub query_timeout: Option<Duration>,
    /// Completion token limit for each model call.
    pub max_tokens: u32,
    /// Sampling temperature, kept low for determinism.
    pub temperature: f32,
    /// Answer returned when the round bound is reached.
    pub fallback_answer: String,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            parallel_queries: false,
            llm_timeout: Some(Duration::from_secs(120)),
            query_timeout: Some(Duration::from_secs(30)),
            max_tokens: 1024,
            temperature: 0.1,
            fallback_answer: DEFAULT_FALLBACK_ANSWER.to_string(),
        }
    }
}

impl RetrievalParams {
    // ==================== Builder Methods ====================

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn with_parallel_queries(mut self, parallel: bool) -> Self {
        self.parallel_queries = parallel;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_fallback_answer(mut self, answer: impl Into<String>) -> Self {
        self.fallback_answer = answer.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = RetrievalParams::default();
        assert_eq!(params.max_rounds, 5);
        assert!(!params.parallel_queries);
        assert_eq!(params.query_timeout, Some(Duration::from_secs(30)));
        assert_eq!(params.fallback_answer, DEFAULT_FALLBACK_ANSWER);
    }

    #[test]
    fn test_builder() {
        let params = RetrievalParams::default()
            .with_max_rounds(2)
            .with_parallel_queries(true)
            .with_query_timeout(None)
            .with_fallback_answer("No idea.");

        assert_eq!(params.max_rounds, 2);
        assert!(params.parallel_queries);
        assert!(params.query_timeout.is_none());
        assert_eq!(params.fallback_answer, "No idea.");
    }
}
