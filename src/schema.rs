//! CSL-JSON schema validation.
//!
//! The CSL data schema is embedded at compile time and each validator is
//! compiled at most once per process, on first use.

use crate::error::{CslError, Result};
use jsonschema::Validator;
use serde_json::{Value, json};
use std::sync::LazyLock;

const CSL_DATA_SCHEMA: &str = include_str!("schema/csl-data.json");

/// The part of the CSL data schema a document is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// A whole CSL-JSON document: an array of items.
    Document,
    /// A single citation item.
    Item,
    /// An item type tag.
    Type,
    /// A name variable.
    Name,
    /// A date variable.
    Date,
}

impl SchemaKind {
    /// Definition name inside the embedded schema, if not the root.
    fn definition(&self) -> Option<&'static str> {
        match self {
            SchemaKind::Document => None,
            SchemaKind::Item => Some("item"),
            SchemaKind::Type => Some("csl-type"),
            SchemaKind::Name => Some("name-variable"),
            SchemaKind::Date => Some("date-variable"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Document => "document",
            SchemaKind::Item => "item",
            SchemaKind::Type => "type",
            SchemaKind::Name => "name",
            SchemaKind::Date => "date",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static DATA_SCHEMA: LazyLock<Value> =
    LazyLock::new(|| serde_json::from_str(CSL_DATA_SCHEMA).unwrap());

/// Build a schema that checks one definition of the data schema while
/// keeping every definition reachable for `$ref`.
fn schema_for(kind: SchemaKind) -> Value {
    match kind.definition() {
        None => DATA_SCHEMA.clone(),
        Some(definition) => json!({
            "$schema": DATA_SCHEMA["$schema"],
            "definitions": DATA_SCHEMA["definitions"],
            "allOf": [{ "$ref": format!("#/definitions/{definition}") }],
        }),
    }
}

fn compile(kind: SchemaKind) -> Validator {
    jsonschema::draft7::new(&schema_for(kind)).unwrap()
}

static DOCUMENT_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(SchemaKind::Document));
static ITEM_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(SchemaKind::Item));
static TYPE_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(SchemaKind::Type));
static NAME_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(SchemaKind::Name));
static DATE_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| compile(SchemaKind::Date));

fn validator(kind: SchemaKind) -> &'static Validator {
    match kind {
        SchemaKind::Document => &DOCUMENT_VALIDATOR,
        SchemaKind::Item => &ITEM_VALIDATOR,
        SchemaKind::Type => &TYPE_VALIDATOR,
        SchemaKind::Name => &NAME_VALIDATOR,
        SchemaKind::Date => &DATE_VALIDATOR,
    }
}

/// Check a JSON document against part of the CSL data schema.
///
/// # Errors
///
/// Returns [`CslError::SchemaValidation`] describing the first violation.
///
/// # Examples
///
/// ```
/// use pkgcite::schema::{validate, SchemaKind};
///
/// let name = serde_json::json!({"family": "Doe", "given": "Jane"});
/// assert!(validate(&name, SchemaKind::Name).is_ok());
/// assert!(validate(&serde_json::json!({"first": "Jane"}), SchemaKind::Name).is_err());
/// ```
pub fn validate(document: &Value, kind: SchemaKind) -> Result<()> {
    validator(kind)
        .validate(document)
        .map_err(|error| CslError::SchemaValidation {
            kind,
            message: error.to_string(),
        })
}

/// Like [`validate`], without describing the violation.
pub fn is_valid(document: &Value, kind: SchemaKind) -> bool {
    validator(kind).is_valid(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_embedded_schema_is_well_formed() {
        assert!(DATA_SCHEMA["definitions"]["item"]["properties"]["author"].is_object());
        assert_eq!(
            DATA_SCHEMA["definitions"]["csl-type"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            crate::CslType::ALL.len()
        );
    }

    #[rstest]
    #[case(json!("webpage"), SchemaKind::Type, true)]
    #[case(json!("software"), SchemaKind::Type, false)]
    #[case(json!({"literal": "Jane Doe"}), SchemaKind::Name, true)]
    #[case(json!({"comma-suffix": true, "family": "Doe"}), SchemaKind::Name, true)]
    #[case(json!({"family": 3}), SchemaKind::Name, false)]
    #[case(json!({"date-parts": [[2020, 1, 15]]}), SchemaKind::Date, true)]
    #[case(json!({"date-parts": [["2020"], [2021]]}), SchemaKind::Date, true)]
    #[case(json!({"date-parts": [[2020], [2021], [2022]]}), SchemaKind::Date, false)]
    #[case(json!({"date-parts": [[2020, 1, 1, 1]]}), SchemaKind::Date, false)]
    #[case(json!({"date-parts": [[]]}), SchemaKind::Date, false)]
    #[case(json!({"type": "book", "id": 1}), SchemaKind::Item, true)]
    #[case(json!({"type": "book"}), SchemaKind::Item, false)]
    #[case(json!({"type": "book", "id": "x", "author": {"literal": "A"}}), SchemaKind::Item, false)]
    #[case(json!({"type": "book", "id": "x", "unknown-field": "A"}), SchemaKind::Item, false)]
    #[case(json!([{"type": "book", "id": "x"}]), SchemaKind::Document, true)]
    #[case(json!({"type": "book", "id": "x"}), SchemaKind::Document, false)]
    fn test_validate(#[case] document: Value, #[case] kind: SchemaKind, #[case] valid: bool) {
        assert_eq!(validate(&document, kind).is_ok(), valid);
        assert_eq!(is_valid(&document, kind), valid);
    }

    #[test]
    fn test_error_carries_kind() {
        let err = validate(&json!(1), SchemaKind::Name).unwrap_err();
        assert!(matches!(
            err,
            CslError::SchemaValidation {
                kind: SchemaKind::Name,
                ..
            }
        ));
    }
}
