//! Per-question retrieval state.

use serde::Serialize;

/// Prefix of a failed-query entry whose query was not valid Cypher
pub const INVALID_SYNTAX_PREFIX: &str = "Invalid syntax of this query: ";
/// Prefix of a failed-query entry whose query matched nothing
pub const NO_DATA_PREFIX: &str = "No data generated for this query: ";
/// Prefix of a failed-query entry whose execution failed for another reason
pub const EXECUTION_FAILED_PREFIX: &str = "Query failed to execute: ";

/// Outcome of executing one candidate query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Rows were returned; `context` is their serialized form
    Success { context: String },
    /// Valid query, no usable rows
    Empty,
    /// Not valid in the query language
    SyntaxInvalid,
    /// Execution failed for another reason (timeout, connection, runtime error)
    Failed { reason: String },
}

/// One candidate query and what happened when it ran (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAttempt {
    pub query: String,
    #[serde(flatten)]
    pub outcome: QueryOutcome,
}

impl QueryAttempt {
    pub fn new(query: impl Into<String>, outcome: QueryOutcome) -> Self {
        Self {
            query: query.into(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Success { .. })
    }

    /// The annotated entry recorded in `failed_queries`, if this attempt failed
    pub fn failure_annotation(&self) -> Option<String> {
        let prefix = match self.outcome {
            QueryOutcome::Success { .. } => return None,
            QueryOutcome::Empty => NO_DATA_PREFIX,
            QueryOutcome::SyntaxInvalid => INVALID_SYNTAX_PREFIX,
            QueryOutcome::Failed { .. } => EXECUTION_FAILED_PREFIX,
        };
        Some(format!("{}{}", prefix, self.query))
    }
}

/// Mutable state of the retrieval loop for a single user question.
///
/// Created fresh for every question and dropped when the question is
/// answered. `accumulated_context[i]` is always the result of
/// `succeeded_queries[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalState {
    question: String,
    rag_question: String,
    accumulated_context: Vec<String>,
    failed_queries: Vec<String>,
    succeeded_queries: Vec<String>,
    attempts: Vec<QueryAttempt>,
    rounds: usize,
}

impl RetrievalState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Start a new query round for the given follow-up question.
    ///
    /// Returns the 1-based round number.
    pub fn begin_round(&mut self, rag_question: impl Into<String>) -> usize {
        self.rag_question = rag_question.into();
        self.rounds += 1;
        self.rounds
    }

    /// Record the outcome of one executed query.
    pub fn record(&mut self, attempt: QueryAttempt) {
        match (&attempt.outcome, attempt.failure_annotation()) {
            (QueryOutcome::Success { context }, _) => {
                self.succeeded_queries.push(attempt.query.clone());
                self.accumulated_context.push(context.clone());
            }
            (_, Some(annotated)) => self.failed_queries.push(annotated),
            (_, None) => {}
        }
        self.attempts.push(attempt);
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn rag_question(&self) -> &str {
        &self.rag_question
    }

    pub fn accumulated_context(&self) -> &[String] {
        &self.accumulated_context
    }

    pub fn failed_queries(&self) -> &[String] {
        &self.failed_queries
    }

    pub fn succeeded_queries(&self) -> &[String] {
        &self.succeeded_queries
    }

    /// Every attempt so far, in execution order
    pub fn attempts(&self) -> &[QueryAttempt] {
        &self.attempts
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Consume the state, keeping only the context used for the answer
    pub fn into_context(self) -> Vec<String> {
        self.accumulated_context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_annotations() {
        let q = "MATCH (n) RETURN n";
        assert_eq!(
            QueryAttempt::new(q, QueryOutcome::SyntaxInvalid).failure_annotation(),
            Some(format!("Invalid syntax of this query: {q}"))
        );
        assert_eq!(
            QueryAttempt::new(q, QueryOutcome::Empty).failure_annotation(),
            Some(format!("No data generated for this query: {q}"))
        );
        assert!(
            QueryAttempt::new(q, QueryOutcome::Success { context: "[1]".into() })
                .failure_annotation()
                .is_none()
        );
    }

    #[test]
    fn test_record_keeps_context_paired_with_queries() {
        let mut state = RetrievalState::new("Who directed Heat?");
        assert_eq!(state.begin_round("Who directed the movie Heat?"), 1);

        state.record(QueryAttempt::new("Q1", QueryOutcome::SyntaxInvalid));
        state.record(QueryAttempt::new(
            "Q2",
            QueryOutcome::Success {
                context: r#"[{"p.name":"Michael Mann"}]"#.into(),
            },
        ));
        state.record(QueryAttempt::new("Q3", QueryOutcome::Empty));
        state.record(QueryAttempt::new(
            "Q4",
            QueryOutcome::Failed {
                reason: "timeout".into(),
            },
        ));

        assert_eq!(state.succeeded_queries(), ["Q2"]);
        assert_eq!(state.accumulated_context().len(), state.succeeded_queries().len());
        assert_eq!(
            state.failed_queries(),
            [
                "Invalid syntax of this query: Q1",
                "No data generated for this query: Q3",
                "Query failed to execute: Q4",
            ]
        );
        assert_eq!(state.attempts().len(), 4);
    }

    #[test]
    fn test_attempt_serializes_with_flat_outcome() {
        let attempt = QueryAttempt::new("RETURN 1", QueryOutcome::Empty);
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["query"], "RETURN 1");
        assert_eq!(json["outcome"], "empty");
    }
}
