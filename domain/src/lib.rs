//! Domain layer for moviegraph
//!
//! This crate contains the core types and pure logic of the movie
//! knowledge-graph chat. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Retrieval round
//!
//! When the model cannot answer from what it already has, it replies with
//! the missing-data marker and a follow-up question. One *round* turns
//! that follow-up into Cypher queries, runs them, and feeds the results
//! back as context:
//!
//! - [`AnswerOutcome`]: final answer or request for context
//! - [`parse_query_list`]: permissive reading of generated queries
//! - [`RetrievalState`]: context, failed and succeeded queries of one question
//!
//! ## Conversation
//!
//! - [`ConversationHistory`]: append-only turns of one chat session

pub mod conversation;
pub mod core;
pub mod cypher;
pub mod prompt;
pub mod retrieval;

// Re-export commonly used types
pub use conversation::entities::{ConversationHistory, Role, Turn};
pub use self::core::{error::DomainError, model::Model, question::Question};
pub use cypher::{Identifier, Statement};
pub use prompt::{PromptBuilder, PromptTemplates};
pub use retrieval::{
    answer::{AnswerOutcome, MISSING_DATA_MARKER, parse_answer},
    query_list::parse_query_list,
    result::{ResultClass, Row, classify_rows, serialize_rows},
    state::{
        EXECUTION_FAILED_PREFIX, INVALID_SYNTAX_PREFIX, NO_DATA_PREFIX, QueryAttempt,
        QueryOutcome, RetrievalState,
    },
};
