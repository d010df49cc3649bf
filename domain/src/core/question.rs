//! Question value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A question asked by the user (Value Object)
///
/// Always non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
}

impl Question {
    /// Try to create a new question, rejecting blank input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidQuestion(
                "question cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            content: trimmed.to_string(),
        })
    }

    /// Get the question content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<&str> for Question {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Question::try_new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_creation_trims() {
        let q = Question::try_new("  Who directed Inception?  ").unwrap();
        assert_eq!(q.content(), "Who directed Inception?");
    }

    #[test]
    fn test_try_new_empty() {
        assert!(Question::try_new("").is_err());
        assert!(Question::try_new("   \n").is_err());
    }

    #[test]
    fn test_try_from_str() {
        let q: Question = "What is Heat about?".try_into().unwrap();
        assert_eq!(q.to_string(), "What is Heat about?");
    }
}
