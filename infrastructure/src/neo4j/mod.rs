//! Neo4j adapter
//!
//! Implements the [`GraphStore`](moviegraph_application::GraphStore) port
//! over Bolt with `neo4rs`.

mod graph_store;

pub use graph_store::{Neo4jGraphStore, Neo4jSettings};
