//! Application layer for moviegraph
//!
//! This crate contains the retrieval loop, the conversation session, port
//! definitions and application configuration. It depends only on the
//! domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::RetrievalParams;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    graph_store::{GraphStore, GraphStoreError},
    llm_gateway::{CompletionRequest, GatewayError, LlmGateway},
    progress::{NoProgress, RetrievalProgress},
};
pub use use_cases::conversation_session::{ConversationSession, GREETING, SessionError};
pub use use_cases::retrieval_loop::{RetrievalError, RetrievalLoopUseCase, RetrievalOutcome};
