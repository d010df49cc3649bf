//! Graph database configuration from TOML (`[graph]` section)

use serde::{Deserialize, Serialize};

/// Raw Neo4j connection configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGraphConfig {
    /// Bolt URI, e.g. `neo4j://localhost:7687`
    pub uri: Option<String>,
    #[serde(deserialize_with = "super::lenient_string")]
    pub username: Option<String>,
    #[serde(deserialize_with = "super::lenient_string")]
    pub password: Option<String>,
    #[serde(deserialize_with = "super::lenient_string")]
    pub database: Option<String>,
    /// Connection pool size
    pub max_connections: usize,
    /// Per-query timeout in seconds (0 disables it)
    pub query_timeout_secs: u64,
}

impl Default for FileGraphConfig {
    fn default() -> Self {
        Self {
            uri: None,
            username: None,
            password: None,
            database: None,
            max_connections: 4,
            query_timeout_secs: 30,
        }
    }
}
