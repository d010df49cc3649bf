//! Retrieval domain: everything the retrieval loop reasons about,
//! without any I/O.
//!
//! - [`answer`]: detecting the missing-data marker in a model answer
//! - [`query_list`]: permissive parsing of generated Cypher query lists
//! - [`result`]: classifying graph result sets
//! - [`state`]: per-question retrieval state and query attempts

pub mod answer;
pub mod query_list;
pub mod result;
pub mod state;
