//! Structured conversation logging.
//!
//! Provides [`JsonlConversationLogger`], a JSONL transcript writer that
//! implements the [`ConversationLogger`](moviegraph_application::ConversationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
