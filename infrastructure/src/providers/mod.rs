//! Language model providers
//!
//! Adapters implementing the [`LlmGateway`](moviegraph_application::LlmGateway) port.

mod chat_completions;

pub use chat_completions::{ChatCompletionsConfig, ChatCompletionsError, ChatCompletionsGateway};
