//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid Cypher identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Prompt template '{template}' is missing the {{{placeholder}}} placeholder")]
    MissingPlaceholder {
        template: &'static str,
        placeholder: &'static str,
    },
}
