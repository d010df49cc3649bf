//! Cypher identifiers and parameterised statements

use crate::core::error::DomainError;
use serde_json::{Map, Value};

/// A validated label, relationship type or property name.
///
/// Only `[A-Za-z_][A-Za-z0-9_]*` is accepted, so the identifier can be
/// written into Cypher text without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(DomainError::InvalidIdentifier(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cypher text plus its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    text: String,
    params: Map<String, Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Map::new(),
        }
    }

    /// Bind `$name` to `value`
    pub fn param(mut self, name: &Identifier, value: impl Into<Value>) -> Self {
        self.params.insert(name.as_str().to_string(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Cheapest possible round trip, used to verify connectivity
    pub fn ping() -> Self {
        Self::new("RETURN 1 AS ok")
    }

    /// Count the nodes carrying `label`; the result column is `count`
    pub fn count_nodes(label: &Identifier) -> Self {
        Self::new(format!("MATCH (n:{}) RETURN count(n) AS count", label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(Identifier::new("Movie").is_ok());
        assert!(Identifier::new("ACTED_IN").is_ok());
        assert!(Identifier::new("_private1").is_ok());

        assert!(Identifier::new("").is_err());
        assert!(Identifier::new("1Movie").is_err());
        assert!(Identifier::new("Movie) DETACH DELETE (n").is_err());
        assert!(Identifier::new("title`").is_err());
    }

    #[test]
    fn test_count_nodes() {
        let label = Identifier::new("Movie").unwrap();
        let stmt = Statement::count_nodes(&label);
        assert_eq!(stmt.text(), "MATCH (n:Movie) RETURN count(n) AS count");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn test_param_binding() {
        let title = Identifier::new("title").unwrap();
        let stmt = Statement::new("MATCH (m:Movie {title: $title}) RETURN m.id")
            .param(&title, "Heat' OR 1=1");
        assert_eq!(stmt.params()["title"], serde_json::json!("Heat' OR 1=1"));
    }
}
