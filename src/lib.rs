//! Build CSL-JSON citations for software packages.
//!
//! `pkgcite` fetches package metadata from software registries (PyPI and
//! crates.io) and normalizes it into [CSL] items, ready for any citation
//! processor that reads CSL-JSON.
//!
//! [CSL]: https://citationstyles.org/
//!
//! # Features
//!
//! - `regex` - Use the `regex` crate for package request parsing (enabled by default)
//! - `lite` - Use `regex-lite` instead, for smaller binaries
//! - `fetch` - Registry fetchers for PyPI and crates.io (enabled by default)
//! - `cli` - The `pkgcite` command-line tool (enabled by default)
//!
//! To use only the data model, disable default features:
//!
//! ```toml
//! [dependencies]
//! pkgcite = { version = "0.1", default-features = false, features = ["regex"] }
//! ```
//!
//! # Data model
//!
//! An [`Item`] is one citable work. Contributors are [`Name`]s, dates are
//! [`Date`]s, and the item type is a [`CslType`]. Loosely typed inputs are
//! coerced through the functions in [`normalize`]:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pkgcite::{CslType, Item};
//!
//! let item = Item::builder(CslType::Webpage, "serde")
//!     .author("David Tolnay")
//!     .issued(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
//!     .title("serde")
//!     .url("https://serde.rs")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(item.author.as_ref().unwrap()[0].literal.as_deref(), Some("David Tolnay"));
//! ```
//!
//! # CSL-JSON conversion
//!
//! Every entity implements [`CslObject`]. Conversion to and from CSL-JSON
//! renames fields (`container_title` ↔ `container-title`, `doi` ↔ `DOI`),
//! rebuilds nested names and dates, and checks the result against the
//! embedded CSL data schema:
//!
//! ```rust
//! use pkgcite::{CslObject, Item};
//!
//! let document = serde_json::json!({
//!     "type": "webpage",
//!     "id": "numpy",
//!     "author": {"literal": "Travis E. Oliphant"},
//!     "container-title": "PyPI",
//! });
//!
//! let item = Item::from_external(&document).unwrap();
//! assert_eq!(item.author.as_ref().unwrap().len(), 1);
//! assert_eq!(item.container_title.as_deref(), Some("PyPI"));
//! ```
//!
//! # Error Handling
//!
//! Construction is all-or-nothing: every fallible operation returns
//! [`CslError`] and no partially valid entity is ever produced.
//!
//! # Thread Safety
//!
//! Entities are plain values and the field table and compiled schemas are
//! read-only process-wide statics, so everything here is `Send + Sync`.

use serde_json::Number;

pub mod convert;
pub mod csl_type;
pub mod date;
pub mod error;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod fields;
pub mod item;
pub mod name;
pub mod normalize;
pub mod output;
pub mod request;
pub mod schema;

// Reexports
pub use convert::Value;
pub use csl_type::CslType;
pub use date::Date;
pub use error::{CslError, Result};
#[cfg(feature = "fetch")]
pub use error::FetchError;
#[cfg(feature = "fetch")]
pub use fetch::{CratesFetcher, FetchConfig, Fetcher, PypiFetcher, Registry, fetch_all};
pub use item::{Item, ItemBuilder};
pub use name::Name;
pub use normalize::{DateInput, NameInput, normalize_date, normalize_name, normalize_name_list};
pub use output::{OutputFormat, read_items, write_items};
pub use request::{PackageRequest, parse_request};
pub use schema::SchemaKind;

mod regex;
#[cfg(feature = "fetch")]
mod utils;

/// A value that is either a number or a string, such as a volume or an
/// edition.
#[derive(Debug, Clone, PartialEq)]
pub enum NumOrStr {
    Number(Number),
    Str(String),
}

impl NumOrStr {
    /// Read from an internal value, `Null` meaning absent.
    pub(crate) fn from_value(value: Value, kind: SchemaKind, field: &str) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(NumOrStr::Number(n))),
            Value::String(s) => Ok(Some(NumOrStr::Str(s))),
            other => Err(convert::field_error(kind, field, "a string or number", &other)),
        }
    }
}

impl From<NumOrStr> for Value {
    fn from(value: NumOrStr) -> Self {
        match value {
            NumOrStr::Number(n) => Value::Number(n),
            NumOrStr::Str(s) => Value::String(s),
        }
    }
}

impl From<&str> for NumOrStr {
    fn from(value: &str) -> Self {
        NumOrStr::Str(value.to_string())
    }
}

impl From<String> for NumOrStr {
    fn from(value: String) -> Self {
        NumOrStr::Str(value)
    }
}

impl From<i64> for NumOrStr {
    fn from(value: i64) -> Self {
        NumOrStr::Number(value.into())
    }
}

impl From<i32> for NumOrStr {
    fn from(value: i32) -> Self {
        NumOrStr::Number(value.into())
    }
}

impl From<u32> for NumOrStr {
    fn from(value: u32) -> Self {
        NumOrStr::Number(value.into())
    }
}

impl std::fmt::Display for NumOrStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumOrStr::Number(n) => write!(f, "{}", n),
            NumOrStr::Str(s) => f.write_str(s),
        }
    }
}

/// A CSL flag such as `comma-suffix` or `circa`.
///
/// The schema allows booleans, numbers and strings; all are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Flag {
    Bool(bool),
    Number(Number),
    Str(String),
}

impl Flag {
    /// Read from an internal value, `Null` meaning absent.
    pub(crate) fn from_value(value: Value, kind: SchemaKind, field: &str) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Flag::Bool(b))),
            Value::Number(n) => Ok(Some(Flag::Number(n))),
            Value::String(s) => Ok(Some(Flag::Str(s))),
            other => Err(convert::field_error(
                kind,
                field,
                "a boolean, number or string",
                &other,
            )),
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Flag::Bool(value)
    }
}

impl From<Flag> for Value {
    fn from(value: Flag) -> Self {
        match value {
            Flag::Bool(b) => Value::Bool(b),
            Flag::Number(n) => Value::Number(n),
            Flag::Str(s) => Value::String(s),
        }
    }
}

/// An entity with a CSL-JSON representation.
///
/// Implementors describe themselves as an internal field map with
/// snake_case keys; the [`convert`] module does the renaming and recursion.
pub trait CslObject: Sized {
    /// Schema the external form must conform to.
    const KIND: SchemaKind;

    /// The internal field map. Unset fields are `Value::Null`.
    fn to_internal(&self) -> Value;

    /// Rebuild from an internal field map.
    ///
    /// # Errors
    ///
    /// Fails if the map has unexpected fields, values of the wrong shape, or
    /// if the rebuilt entity does not conform to its schema.
    fn from_internal(value: Value) -> Result<Self>;

    /// Convert to a CSL-JSON value, checked against [`Self::KIND`].
    fn to_external(&self) -> Result<serde_json::Value> {
        let out = convert::to_external(&self.to_internal())?;
        schema::validate(&out, Self::KIND)?;
        Ok(out)
    }

    /// Build from a CSL-JSON value.
    fn from_external(document: &serde_json::Value) -> Result<Self> {
        Self::from_internal(convert::to_internal(document)?)
    }

    /// Compact CSL-JSON string.
    fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_external()?)?)
    }

    /// Structural comparison with a JSON-encoded string of the same shape.
    ///
    /// A string that is not valid JSON never matches.
    fn matches_json(&self, other: &str) -> bool {
        match (serde_json::from_str::<serde_json::Value>(other), self.to_external()) {
            (Ok(other), Ok(this)) => this == other,
            _ => false,
        }
    }
}
