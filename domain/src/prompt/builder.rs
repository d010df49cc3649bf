//! Rendering of the query-generation and answer-generation prompts

use super::template::{PromptTemplates, render};
use crate::conversation::entities::ConversationHistory;
use crate::core::error::DomainError;
use std::collections::HashMap;

/// Placeholder text for an empty list
const NONE: &str = "(none)";

/// Renders prompts from a validated set of [`PromptTemplates`].
///
/// Pure: the same inputs always produce the same prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    templates: PromptTemplates,
}

impl PromptBuilder {
    pub fn new(templates: PromptTemplates) -> Result<Self, DomainError> {
        templates.validate()?;
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Prompt asking the model for Cypher queries answering `question`.
    ///
    /// `failed_queries` are already annotated with their failure reason.
    pub fn build_query_prompt(
        &self,
        question: &str,
        failed_queries: &[String],
        succeeded_queries: &[String],
    ) -> String {
        let vars = HashMap::from([
            ("question", question.to_string()),
            ("previous_queries", bullet_list(failed_queries)),
            ("used_queries", bullet_list(succeeded_queries)),
            ("cypher_schema", self.templates.cypher_schema.clone()),
            ("cypher_examples", self.templates.cypher_examples.clone()),
        ]);
        render(&self.templates.cypher_prompt, &vars)
    }

    /// Prompt asking the model to answer `question` from `context` and
    /// the conversation so far.
    pub fn build_answer_prompt(
        &self,
        question: &str,
        context: &[String],
        history: &ConversationHistory,
    ) -> String {
        let vars = HashMap::from([
            ("question", question.to_string()),
            ("context", bullet_list(context)),
            ("chat_history", format_history(history)),
        ]);
        render(&self.templates.base, &vars)
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return NONE.to_string();
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_history(history: &ConversationHistory) -> String {
    if history.is_empty() {
        return NONE.to_string();
    }

    let mut lines = Vec::with_capacity(history.turns().len());
    for turn in history.turns() {
        lines.push(format!("{}: {}", turn.role(), turn.content()));
        for context in turn.context() {
            lines.push(format!("  context: {}", context));
        }
    }
    lines.join("\n")
}
