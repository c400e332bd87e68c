//! Coercion of loosely typed inputs into names and dates.
//!
//! Fetchers and documents describe contributors and dates in many shapes:
//! a bare string, a CSL-JSON object, a calendar date, a list of either.
//! [`NameInput`] and [`DateInput`] name those shapes explicitly, and the
//! `normalize_*` functions turn each one into a validated entity.

use crate::convert::{self, Value};
use crate::date::DatePart;
use crate::error::{CslError, Result};
use crate::{CslObject, Date, Name, NumOrStr};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use itertools::Itertools;
use serde_json::{Map, Value as Json};

/// Anything that can become a [`Name`], or a list of names.
#[derive(Debug, Clone, PartialEq)]
pub enum NameInput {
    /// An unparsed name, kept as `literal`.
    Literal(String),
    /// A CSL-JSON name object.
    Structured(Map<String, Json>),
    /// An already built name.
    Prebuilt(Name),
    /// Several names.
    Sequence(Vec<NameInput>),
}

impl NameInput {
    fn kind(&self) -> &'static str {
        match self {
            NameInput::Literal(_) => "string",
            NameInput::Structured(_) => "mapping",
            NameInput::Prebuilt(_) => "name",
            NameInput::Sequence(_) => "sequence",
        }
    }
}

impl From<&str> for NameInput {
    fn from(value: &str) -> Self {
        NameInput::Literal(value.to_string())
    }
}

impl From<String> for NameInput {
    fn from(value: String) -> Self {
        NameInput::Literal(value)
    }
}

impl From<Name> for NameInput {
    fn from(value: Name) -> Self {
        NameInput::Prebuilt(value)
    }
}

impl From<Map<String, Json>> for NameInput {
    fn from(value: Map<String, Json>) -> Self {
        NameInput::Structured(value)
    }
}

impl<T: Into<NameInput>> From<Vec<T>> for NameInput {
    fn from(value: Vec<T>) -> Self {
        NameInput::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<NameInput>, const N: usize> From<[T; N]> for NameInput {
    fn from(value: [T; N]) -> Self {
        NameInput::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<Json> for NameInput {
    type Error = CslError;

    fn try_from(value: Json) -> Result<Self> {
        match value {
            Json::String(s) => Ok(NameInput::Literal(s)),
            Json::Object(map) => Ok(NameInput::Structured(map)),
            Json::Array(items) => items
                .into_iter()
                .map(NameInput::try_from)
                .try_collect()
                .map(NameInput::Sequence),
            Json::Null => Err(CslError::unsupported("name", "null")),
            Json::Bool(_) => Err(CslError::unsupported("name", "boolean")),
            Json::Number(_) => Err(CslError::unsupported("name", "number")),
        }
    }
}

impl TryFrom<Value> for NameInput {
    type Error = CslError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(NameInput::Literal(s)),
            Value::Name(name) => Ok(NameInput::Prebuilt(name)),
            Value::List(items) => items
                .into_iter()
                .map(NameInput::try_from)
                .try_collect()
                .map(NameInput::Sequence),
            map @ Value::Map(_) => match convert::to_external(&map)? {
                Json::Object(map) => Ok(NameInput::Structured(map)),
                _ => Err(CslError::unsupported("name", "mapping")),
            },
            other => Err(CslError::unsupported("name", other.kind())),
        }
    }
}

/// Anything that can become a [`Date`].
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// Free text, kept as `literal`.
    Literal(String),
    /// A CSL-JSON date object.
    Structured(Map<String, Json>),
    /// An already built date.
    Prebuilt(Date),
    /// A single calendar date.
    Calendar(NaiveDate),
    /// A start date and optional end date.
    Calendars(Vec<NaiveDate>),
    /// Raw `date-parts`.
    Parts(Vec<Vec<DatePart>>),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Literal(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Literal(value)
    }
}

impl From<Date> for DateInput {
    fn from(value: Date) -> Self {
        DateInput::Prebuilt(value)
    }
}

impl From<Map<String, Json>> for DateInput {
    fn from(value: Map<String, Json>) -> Self {
        DateInput::Structured(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Calendar(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Calendar(value.date())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        DateInput::Calendar(value.date_naive())
    }
}

impl From<(NaiveDate, NaiveDate)> for DateInput {
    fn from((start, end): (NaiveDate, NaiveDate)) -> Self {
        DateInput::Calendars(vec![start, end])
    }
}

impl From<Vec<NaiveDate>> for DateInput {
    fn from(value: Vec<NaiveDate>) -> Self {
        DateInput::Calendars(value)
    }
}

impl From<Vec<Vec<DatePart>>> for DateInput {
    fn from(value: Vec<Vec<DatePart>>) -> Self {
        DateInput::Parts(value)
    }
}

fn parts_from_json(items: Vec<Json>) -> Result<Vec<Vec<DatePart>>> {
    items
        .into_iter()
        .map(|inner| match inner {
            Json::Array(components) => components
                .into_iter()
                .map(|c| match c {
                    Json::Number(n) => Ok(NumOrStr::Number(n)),
                    Json::String(s) => Ok(NumOrStr::Str(s)),
                    _ => Err(CslError::unsupported("date part", "non-scalar")),
                })
                .try_collect(),
            _ => Err(CslError::unsupported("date parts", "non-sequence")),
        })
        .try_collect()
}

impl TryFrom<Json> for DateInput {
    type Error = CslError;

    fn try_from(value: Json) -> Result<Self> {
        match value {
            Json::String(s) => Ok(DateInput::Literal(s)),
            Json::Object(map) => Ok(DateInput::Structured(map)),
            Json::Array(items) => parts_from_json(items).map(DateInput::Parts),
            Json::Null => Err(CslError::unsupported("date", "null")),
            Json::Bool(_) => Err(CslError::unsupported("date", "boolean")),
            Json::Number(_) => Err(CslError::unsupported("date", "number")),
        }
    }
}

impl TryFrom<Value> for DateInput {
    type Error = CslError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Date(date) => Ok(DateInput::Prebuilt(date)),
            Value::String(s) => Ok(DateInput::Literal(s)),
            list @ Value::List(_) => match convert::to_external(&list)? {
                Json::Array(items) => parts_from_json(items).map(DateInput::Parts),
                _ => Err(CslError::unsupported("date", "sequence")),
            },
            map @ Value::Map(_) => match convert::to_external(&map)? {
                Json::Object(map) => Ok(DateInput::Structured(map)),
                _ => Err(CslError::unsupported("date", "mapping")),
            },
            other => Err(CslError::unsupported("date", other.kind())),
        }
    }
}

/// Coerce one name-like input into a [`Name`].
///
/// Strings become literal names and CSL-JSON objects are validated.
///
/// # Errors
///
/// Returns [`CslError::UnsupportedInputType`] for a sequence, and schema
/// errors for an invalid name object.
///
/// # Examples
///
/// ```
/// use pkgcite::normalize_name;
///
/// let name = normalize_name("Jane Doe").unwrap();
/// assert_eq!(name.literal.as_deref(), Some("Jane Doe"));
/// assert!(name.family.is_none());
/// ```
pub fn normalize_name(input: impl Into<NameInput>) -> Result<Name> {
    match input.into() {
        NameInput::Prebuilt(name) => Ok(name),
        NameInput::Literal(literal) => Ok(Name::literal(literal)),
        NameInput::Structured(map) => Name::from_external(&Json::Object(map)),
        other @ NameInput::Sequence(_) => Err(CslError::unsupported("name", other.kind())),
    }
}

/// Coerce a name or list of names into a list of [`Name`]s.
///
/// A single name is wrapped into a one-element list; only an explicit
/// sequence is normalized element by element.
///
/// # Examples
///
/// ```
/// use pkgcite::normalize_name_list;
///
/// let one = normalize_name_list(Some("Jane Doe".into())).unwrap().unwrap();
/// assert_eq!(one.len(), 1);
///
/// let two = normalize_name_list(Some(["Jane Doe", "John Smith"].into())).unwrap().unwrap();
/// assert_eq!(two.len(), 2);
/// ```
pub fn normalize_name_list(input: Option<NameInput>) -> Result<Option<Vec<Name>>> {
    match input {
        None => Ok(None),
        Some(NameInput::Sequence(items)) => items
            .into_iter()
            .map(normalize_name)
            .try_collect()
            .map(Some),
        Some(single) => normalize_name(single).map(|name| Some(vec![name])),
    }
}

/// Coerce a date-like input into a [`Date`].
///
/// # Errors
///
/// Returns [`CslError::UnsupportedInputType`] for a list of calendar dates
/// that is not one or two long, and date errors for invalid parts.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pkgcite::{normalize_date, NumOrStr};
///
/// let day = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
/// let date = normalize_date(Some(day.into())).unwrap().unwrap();
/// assert_eq!(date.date_parts().unwrap()[0][0], NumOrStr::from(2020));
/// ```
pub fn normalize_date(input: Option<DateInput>) -> Result<Option<Date>> {
    let Some(input) = input else {
        return Ok(None);
    };
    let date = match input {
        DateInput::Prebuilt(date) => date,
        DateInput::Structured(map) => Date::from_external(&Json::Object(map))?,
        DateInput::Literal(literal) => Date::literal(literal),
        DateInput::Calendar(day) => Date::from_date(day, None),
        DateInput::Calendars(days) => match days.as_slice() {
            [start] => Date::from_date(*start, None),
            [start, end] => Date::from_date(*start, Some(*end)),
            _ => return Err(CslError::unsupported("date", "sequence of calendar dates")),
        },
        DateInput::Parts(parts) => Date::new(parts)?,
    };
    Ok(Some(date))
}
