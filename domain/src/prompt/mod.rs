//! Prompt domain
//!
//! Templates and the builder that renders the two prompts of the
//! retrieval flow: query generation and answer generation.

mod builder;
mod template;

pub use builder::PromptBuilder;
pub use template::{PromptTemplates, render};
