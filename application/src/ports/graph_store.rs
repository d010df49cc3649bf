//! Graph store port
//!
//! Defines how the application layer runs Cypher against the movie graph.

use async_trait::async_trait;
use moviegraph_domain::{Identifier, Row, Statement};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while executing a query
#[derive(Error, Debug)]
pub enum GraphStoreError {
    /// The query is not valid Cypher
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The database rejected or aborted a syntactically valid query
    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Could not decode result: {0}")]
    Decode(String),
}

impl GraphStoreError {
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, GraphStoreError::Syntax(_))
    }
}

/// Executes queries against the graph database.
///
/// Every call runs in its own short-lived session; no transaction spans
/// two calls. A valid query matching nothing returns `Ok(vec![])`.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a raw query, typically one written by the model
    async fn execute(&self, query: &str) -> Result<Vec<Row>, GraphStoreError>;

    /// Run a statement built by the application, with bound parameters
    async fn execute_statement(&self, statement: &Statement)
    -> Result<Vec<Row>, GraphStoreError>;

    /// Number of nodes carrying `label`
    async fn node_count(&self, label: &Identifier) -> Result<u64, GraphStoreError> {
        let rows = self
            .execute_statement(&Statement::count_nodes(label))
            .await?;
        rows.first()
            .and_then(|row| row.get("count"))
            .and_then(|count| count.as_u64())
            .ok_or_else(|| GraphStoreError::Decode("missing count column".to_string()))
    }
}
