//! Prompt template loading
//!
//! Reads the prompt templates from a TOML file with the keys
//! `cypher_prompt`, `cypher_schema`, `cypher_examples` and `base`.
//! Keys left out of the file keep their built-in default.

mod loader;

pub use loader::{PromptFileLoader, PromptLoadError};
