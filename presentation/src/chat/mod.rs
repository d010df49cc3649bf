//! Interactive chat module
//!
//! Provides a readline-based interactive chat with the movie assistant.

mod repl;

pub use repl::{ChatRepl, ReplCommand};
