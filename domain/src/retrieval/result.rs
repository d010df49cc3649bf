//! Graph result sets and their classification.

use serde_json::{Map, Value};

/// One result row: column name → value
pub type Row = Map<String, Value>;

/// How a successfully executed query's rows feed the retrieval loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultClass {
    /// Usable data, serialized for the answer prompt
    Data(String),
    /// Nothing worth adding to the context
    Empty,
}

/// Serialize rows the way they are shown to the model.
pub fn serialize_rows(rows: &[Row]) -> String {
    Value::Array(rows.iter().cloned().map(Value::Object).collect()).to_string()
}

/// Classify the rows returned by a syntactically valid query.
///
/// No rows serialize to `[]` and are [`ResultClass::Empty`]. Rows whose
/// values are all `null` (e.g. `RETURN m.budget` on a movie without a
/// budget) carry no information either and are also `Empty`. As soon as
/// one row has one non-null value the whole result is `Data`, including
/// its partially-null rows.
pub fn classify_rows(rows: &[Row]) -> ResultClass {
    let has_data = rows
        .iter()
        .any(|row| row.values().any(|value| !value.is_null()));
    if !has_data {
        return ResultClass::Empty;
    }

    let serialized = serialize_rows(rows);
    if serialized.trim() == "[]" {
        ResultClass::Empty
    } else {
        ResultClass::Data(serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_no_rows_is_empty() {
        assert_eq!(serialize_rows(&[]), "[]");
        assert_eq!(classify_rows(&[]), ResultClass::Empty);
    }

    #[test]
    fn test_rows_are_serialized_as_json() {
        let rows = vec![row(json!({"p.name": "Christopher Nolan"}))];
        assert_eq!(
            classify_rows(&rows),
            ResultClass::Data(r#"[{"p.name":"Christopher Nolan"}]"#.to_string())
        );
    }

    #[test]
    fn test_all_null_rows_are_empty() {
        let rows = vec![
            row(json!({"m.budget": null})),
            row(json!({"m.budget": null})),
        ];
        assert_eq!(classify_rows(&rows), ResultClass::Empty);
    }

    #[test]
    fn test_rows_without_columns_are_empty() {
        let rows = vec![Row::new()];
        assert_eq!(classify_rows(&rows), ResultClass::Empty);
    }

    #[test]
    fn test_partially_null_rows_are_data() {
        let rows = vec![
            row(json!({"m.title": "Heat", "m.budget": null})),
            row(json!({"m.title": null, "m.budget": null})),
        ];
        let ResultClass::Data(serialized) = classify_rows(&rows) else {
            panic!("expected data");
        };
        assert!(serialized.contains("Heat"));
        assert!(serialized.contains("null"));
    }
}
