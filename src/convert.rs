//! Recursive conversion between internal values and CSL-JSON.
//!
//! Entities describe themselves as a [`Value`] tree keyed by internal
//! (snake_case) field names. [`to_external`] walks that tree into a
//! `serde_json::Value`, renaming through [`crate::fields`] and dropping
//! unset fields. [`to_internal`] walks a CSL-JSON document back, rebuilding
//! names, dates and item types for the fields that hold them.

use crate::error::{CslError, Result};
use crate::item::Item;
use crate::schema::SchemaKind;
use crate::{CslObject, CslType, Date, Name, fields};
use itertools::Itertools;
use serde_json::{Map, Number, Value as Json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// A node of the internal object graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unset. Dropped from mappings on conversion.
    Null,
    Bool(bool),
    Number(Number),
    /// A string in its internal spelling.
    String(String),
    List(Vec<Value>),
    /// Ordered key/value pairs. Keys must convert to strings.
    Map(Vec<(Value, Value)>),
    Type(CslType),
    Name(Name),
    Date(Date),
}

impl Value {
    /// Short description of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Type(_) => "type",
            Value::Name(_) => "name",
            Value::Date(_) => "date",
        }
    }

    /// Build a mapping with string keys.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.into()), v))
                .collect(),
        )
    }

    /// Split a mapping into string-keyed entries.
    pub(crate) fn into_entries(self, kind: SchemaKind) -> Result<Vec<(String, Value)>> {
        let Value::Map(entries) = self else {
            return Err(CslError::SchemaValidation {
                kind,
                message: format!("expected a mapping, found {}", self.kind()),
            });
        };
        entries
            .into_iter()
            .map(|(key, value)| match key {
                Value::String(key) => Ok((key, value)),
                other => Err(CslError::KeyType(other.kind().to_string())),
            })
            .try_collect()
    }

    /// Read an optional string field.
    pub(crate) fn into_string(self, kind: SchemaKind, field: &str) -> Result<Option<String>> {
        match self {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(field_error(kind, field, "a string", &other)),
        }
    }

    /// Read an optional list of strings.
    pub(crate) fn into_strings(self, kind: SchemaKind, field: &str) -> Result<Option<Vec<String>>> {
        match self {
            Value::Null => Ok(None),
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(field_error(kind, field, "a list of strings", &other)),
                })
                .try_collect()
                .map(Some),
            other => Err(field_error(kind, field, "a list of strings", &other)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<Name> for Value {
    fn from(value: Name) -> Self {
        Value::Name(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<CslType> for Value {
    fn from(value: CslType) -> Self {
        Value::Type(value)
    }
}

pub(crate) fn field_error(kind: SchemaKind, field: &str, expected: &str, found: &Value) -> CslError {
    CslError::SchemaValidation {
        kind,
        message: format!(
            "`{}` must be {}, found {}",
            fields::to_external(field),
            expected,
            found.kind()
        ),
    }
}

pub(crate) fn unexpected_field(kind: SchemaKind, field: &str) -> CslError {
    CslError::SchemaValidation {
        kind,
        message: format!("unexpected field `{}`", fields::to_external(field)),
    }
}

/// How a CSL-JSON field is rebuilt on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Type,
    NameList,
    Date,
}

static FIELD_KINDS: LazyLock<HashMap<&'static str, FieldKind>> = LazyLock::new(|| {
    let names = Item::NAME_FIELDS.iter().map(|&f| (f, FieldKind::NameList));
    let dates = Item::DATE_FIELDS.iter().map(|&f| (f, FieldKind::Date));
    std::iter::once(("type", FieldKind::Type))
        .chain(names)
        .chain(dates)
        .map(|(field, kind)| (fields::to_external(field), kind))
        .collect()
});

/// Convert an internal value into CSL-JSON.
///
/// Mapping keys are renamed through the field table. String values are
/// left alone apart from hyphenated type tags. Names, dates and types convert themselves and are validated.
///
/// # Errors
///
/// Returns [`CslError::KeyType`] for a mapping key that is neither a string
/// nor an integer, and schema errors from nested entities.
///
/// # Examples
///
/// ```
/// use pkgcite::convert::{to_external, Value};
///
/// let value = Value::map([
///     ("container_title", Value::from("Nature")),
///     ("volume", Value::Null),
/// ]);
/// assert_eq!(
///     to_external(&value).unwrap(),
///     serde_json::json!({"container-title": "Nature"})
/// );
/// ```
pub fn to_external(value: &Value) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Number(n) => Ok(Json::Number(n.clone())),
        Value::String(s) => Ok(Json::String(fields::value_to_external(s).to_string())),
        Value::List(items) => items.iter().map(to_external).try_collect().map(Json::Array),
        Value::Map(entries) => {
            let mut out = Map::new();
            for (key, value) in entries {
                if matches!(value, Value::Null) {
                    continue;
                }
                out.insert(external_key(key)?, to_external(value)?);
            }
            Ok(Json::Object(out))
        }
        Value::Type(t) => t.to_external(),
        Value::Name(name) => name.to_external(),
        Value::Date(date) => date.to_external(),
    }
}

fn external_key(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(fields::to_external(s).to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(CslError::KeyType(other.kind().to_string())),
    }
}

/// Convert CSL-JSON into an internal value.
///
/// Keys are renamed through the field table and string values through the
/// type tag table. Values of
/// `type`, of name-list fields and of date fields are rebuilt as
/// [`CslType`], lists of [`Name`] and [`Date`]; a single name object is
/// wrapped into a one-element list. Everything else converts recursively.
///
/// # Examples
///
/// ```
/// use pkgcite::convert::{to_internal, Value};
///
/// let value = to_internal(&serde_json::json!({"title-short": "CSL"})).unwrap();
/// assert_eq!(value, Value::map([("title_short", Value::from("CSL"))]));
/// ```
pub fn to_internal(document: &Json) -> Result<Value> {
    match document {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(Value::Number(n.clone())),
        Json::String(s) => Ok(Value::String(fields::value_to_internal(s).to_string())),
        Json::Array(items) => items.iter().map(to_internal).try_collect().map(Value::List),
        Json::Object(map) => map
            .iter()
            .map(|(key, value)| -> Result<(Value, Value)> {
                let internal = Value::String(fields::to_internal(key).to_string());
                Ok((internal, rehydrate(key, value)?))
            })
            .try_collect()
            .map(Value::Map),
    }
}

fn rehydrate(key: &str, value: &Json) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let Some(kind) = FIELD_KINDS.get(key) else {
        tracing::trace!(key, "no entity registered for field");
        return to_internal(value);
    };
    match (kind, value) {
        (FieldKind::Type, _) => CslType::from_external(value).map(Value::Type),
        (FieldKind::NameList, Json::Array(items)) => items
            .iter()
            .map(|item| Name::from_external(item).map(Value::Name))
            .try_collect()
            .map(Value::List),
        (FieldKind::NameList, single) => {
            Ok(Value::List(vec![Value::Name(Name::from_external(single)?)]))
        }
        (FieldKind::Date, _) => Date::from_external(value).map(Value::Date),
    }
}
