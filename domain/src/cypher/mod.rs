//! Typed Cypher statements.
//!
//! Statements issued by the application itself (as opposed to queries
//! written by the model) are built here: identifiers such as labels are
//! validated before being spliced into the text, and values are always
//! bound as parameters.

mod statement;

pub use statement::{Identifier, Statement};
