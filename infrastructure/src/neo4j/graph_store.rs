//! Neo4j graph store

use crate::config::FileGraphConfig;
use async_trait::async_trait;
use moviegraph_application::ports::graph_store::{GraphStore, GraphStoreError};
use moviegraph_domain::{Row, Statement};
use neo4rs::{BoltList, BoltMap, BoltNull, BoltType, ConfigBuilder, Graph, Query, query};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// Neo4j error code of a query that does not parse
const SYNTAX_ERROR_CODE: &str = "Neo.ClientError.Statement.SyntaxError";

/// Connection settings for [`Neo4jGraphStore`]
#[derive(Clone, PartialEq, Eq)]
pub struct Neo4jSettings {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

impl fmt::Debug for Neo4jSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neo4jSettings")
            .field("uri", &self.uri)
            .field("username", &self.username)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

impl Neo4jSettings {
    /// Settings from the `[graph]` section; fails when a required value is missing.
    pub fn from_config(config: &FileGraphConfig) -> Result<Self, GraphStoreError> {
        let required = |field: &str, value: &Option<String>| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GraphStoreError::Connection(format!("graph.{field} is not set")))
        };

        Ok(Self {
            uri: required("uri", &config.uri)?,
            username: required("username", &config.username)?,
            password: required("password", &config.password)?,
            database: required("database", &config.database)?,
            max_connections: config.max_connections.max(1),
        })
    }
}

/// [`GraphStore`] backed by a pooled Neo4j connection.
///
/// Every call borrows a connection from the driver's pool for the duration
/// of one auto-commit query.
pub struct Neo4jGraphStore {
    graph: Graph,
    database: String,
}

impl Neo4jGraphStore {
    /// Connect and verify the database answers.
    pub async fn connect(settings: &Neo4jSettings) -> Result<Self, GraphStoreError> {
        info!(
            uri = %settings.uri,
            database = %settings.database,
            "Connecting to Neo4j"
        );

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.username.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .max_connections(settings.max_connections)
            .build()
            .map_err(|e| GraphStoreError::Connection(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| GraphStoreError::Connection(e.to_string()))?;

        let store = Self {
            graph,
            database: settings.database.clone(),
        };
        store.ping().await?;
        Ok(store)
    }

    /// Run a trivial statement to check connectivity.
    pub async fn ping(&self) -> Result<(), GraphStoreError> {
        self.run(Self::to_query(&Statement::ping())).await.map(|_| ())
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Release the connection pool.
    pub fn close(self) {
        info!(database = %self.database, "Closing Neo4j connection pool");
        drop(self.graph);
    }

    async fn run(&self, query: Query) -> Result<Vec<Row>, GraphStoreError> {
        let mut result = self.graph.execute(query).await.map_err(map_error)?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.map_err(map_error)? {
            let decoded = row
                .to::<Row>()
                .map_err(|e| GraphStoreError::Decode(e.to_string()))?;
            rows.push(decoded);
        }
        debug!("Query returned {} rows", rows.len());
        Ok(rows)
    }

    fn to_query(statement: &Statement) -> Query {
        statement
            .params()
            .iter()
            .fold(query(statement.text()), |q, (name, value)| {
                q.param(name, to_bolt(value))
            })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn execute(&self, cypher: &str) -> Result<Vec<Row>, GraphStoreError> {
        self.run(query(cypher)).await
    }

    async fn execute_statement(&self, statement: &Statement) -> Result<Vec<Row>, GraphStoreError> {
        self.run(Self::to_query(statement)).await
    }
}

fn map_error(error: neo4rs::Error) -> GraphStoreError {
    match error {
        neo4rs::Error::Neo4j(e) => classify_failure(e.code(), e.message()),
        other => GraphStoreError::Connection(other.to_string()),
    }
}

/// Map a server-side failure to the port's error taxonomy by its status code.
fn classify_failure(code: &str, message: &str) -> GraphStoreError {
    let detail = format!("{code}: {message}");
    if code == SYNTAX_ERROR_CODE {
        GraphStoreError::Syntax(detail)
    } else if code.starts_with("Neo.ClientError.Security.") {
        GraphStoreError::Connection(detail)
    } else {
        GraphStoreError::Execution(detail)
    }
}

/// Convert a JSON parameter value to its Bolt representation
fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        Value::String(s) => s.clone().into(),
        Value::Array(items) => {
            BoltType::List(BoltList::from(items.iter().map(to_bolt).collect::<Vec<_>>()))
        }
        Value::Object(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(key.as_str().into(), to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}
