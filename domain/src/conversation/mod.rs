//! Conversation domain.
//!
//! - [`entities::Turn`]: one message of the conversation
//! - [`entities::ConversationHistory`]: the append-only turn log of a session

pub mod entities;
