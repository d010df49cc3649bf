//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod conversation_session;
pub mod retrieval_loop;
