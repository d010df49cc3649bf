//! Prompt templates for the retrieval flow

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four template texts the prompts are rendered from.
///
/// `cypher_prompt` and `base` are templates with `{placeholder}` slots;
/// `cypher_schema` and `cypher_examples` are plain text substituted into
/// `cypher_prompt`. Loaded once at startup, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// Query-generation template.
    /// Slots: `{question}`, `{previous_queries}`, `{used_queries}`,
    /// `{cypher_schema}`, `{cypher_examples}`
    pub cypher_prompt: String,
    /// Graph schema description
    pub cypher_schema: String,
    /// Worked question → query examples
    pub cypher_examples: String,
    /// Answer-generation template.
    /// Slots: `{question}`, `{context}`, `{chat_history}`
    pub base: String,
}

impl PromptTemplates {
    /// System prompt for answer generation
    pub fn answer_system() -> &'static str {
        "You are movie chatbot"
    }

    /// System prompt for query generation
    pub fn query_system() -> &'static str {
        "You are an expert Neo4j Cypher generator."
    }

    /// Check that both templates can carry the question.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, template) in [("cypher_prompt", &self.cypher_prompt), ("base", &self.base)] {
            if !template.contains("{question}") {
                return Err(DomainError::MissingPlaceholder {
                    template: name,
                    placeholder: "question",
                });
            }
        }
        Ok(())
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            cypher_prompt: DEFAULT_CYPHER_PROMPT.to_string(),
            cypher_schema: DEFAULT_CYPHER_SCHEMA.to_string(),
            cypher_examples: DEFAULT_CYPHER_EXAMPLES.to_string(),
            base: DEFAULT_BASE_PROMPT.to_string(),
        }
    }
}

/// Render `template`, replacing `{name}` with `vars[name]`.
///
/// `{{` and `}}` produce literal braces. Slots with no matching variable
/// are kept verbatim. Substituted values are never re-scanned.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(['{', '}']) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        if let Some(after) = rest.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = rest.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if let Some((name, after)) = slot(rest)
            && let Some(value) = vars.get(name)
        {
            out.push_str(value);
            rest = after;
        } else {
            // Lone brace or unknown slot
            out.push_str(&rest[..1]);
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Split `{name}rest` into `(name, rest)` when `name` is an identifier.
fn slot(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('{')?;
    let end = inner.find('}')?;
    let name = &inner[..end];
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| (name, &inner[end + 1..]))
}

const DEFAULT_CYPHER_PROMPT: &str = r#"Task: Generate Cypher statements to query a Neo4j movie graph database.

Instructions:
- Use only the node labels, relationship types and properties provided in the schema.
- Match titles and names case-insensitively with toLower() when unsure of the exact spelling.
- Always return named properties, never whole nodes, and LIMIT large result sets.
- Do not repeat a query that already failed; fix it or try a different approach.
- Do not repeat a query that already returned data.
- If several queries are needed, return them as a list of strings, e.g. ["MATCH ...", "MATCH ..."].
- Return only the Cypher statement(s). No explanations, no apologies, no markdown.

Schema:
{cypher_schema}

Examples:
{cypher_examples}

Queries that failed before (do not repeat them):
{previous_queries}

Queries that already returned data (do not repeat them):
{used_queries}

Question:
{question}
"#;

const DEFAULT_CYPHER_SCHEMA: &str = r#"Node labels and properties:
- Movie {id, title, original_title, overview, release_date (date), budget, popularity, revenue, runtime, vote_average, vote_count, movie_info}
- Person {person_id, name}; persons additionally carry the labels Actor, Director and/or Crew
- Genre {genre_id, name}
- Keyword {keyword_id, name}
- Collection {collection_id, name}
- ProductionCompany {company_id, name}
- ProductionCountry {country_code, name}
- SpokenLanguage {language_code, name}

Relationships:
- (:Person:Actor)-[:ACTED_IN {character}]->(:Movie)
- (:Person:Director)-[:DIRECTED]->(:Movie)
- (:Person:Crew)-[:WORKED_AS {department, job}]->(:Movie)
- (:Genre)-[:OF_GENRE]->(:Movie)
- (:Keyword)-[:HAS_KEYWORD]->(:Movie)
- (:Collection)-[:PART_OF_COLLECTION]->(:Movie)
- (:ProductionCompany)-[:PRODUCED_BY]->(:Movie)
- (:ProductionCountry)-[:PRODUCED_IN]->(:Movie)
- (:SpokenLanguage)-[:SPOKEN_IN]->(:Movie)"#;

const DEFAULT_CYPHER_EXAMPLES: &str = r#"Question: Who directed Inception?
Cypher: MATCH (p:Person)-[:DIRECTED]->(m:Movie) WHERE toLower(m.title) = 'inception' RETURN p.name

Question: Which actors played in Heat and which characters did they play?
Cypher: MATCH (p:Person)-[r:ACTED_IN]->(m:Movie) WHERE toLower(m.title) = 'heat' RETURN p.name, r.character LIMIT 25

Question: What are the five most popular comedies released after 2000?
Cypher: MATCH (g:Genre {name: 'Comedy'})-[:OF_GENRE]->(m:Movie) WHERE m.release_date >= date('2001-01-01') RETURN m.title, m.popularity ORDER BY m.popularity DESC LIMIT 5

Question: Which movies belong to the same collection as The Dark Knight?
Cypher: MATCH (c:Collection)-[:PART_OF_COLLECTION]->(:Movie {title: 'The Dark Knight'}) MATCH (c)-[:PART_OF_COLLECTION]->(m:Movie) RETURN c.name, m.title"#;

const DEFAULT_BASE_PROMPT: &str = r#"You are a helpful assistant answering questions about movies, their cast, crew, genres and production.

Answer using the conversation history and the additional context below.
If the question needs facts that are neither in the context nor in the conversation history,
do not guess: reply only with NO_CONTEXT followed by one precise question describing the data you need,
for example: NO_CONTEXT Who directed the movie Inception?

Conversation history:
{chat_history}

Additional context (results of database queries):
{context}

Question:
{question}
"#;
