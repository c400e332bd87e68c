//! Error types for CSL entity construction and conversion.
//!
//! Every fallible operation in the core returns [`CslError`]. Construction is
//! all-or-nothing: an entity either validates completely or an error is
//! returned, there is no partially built state.

use crate::schema::SchemaKind;
use thiserror::Error;

/// Top-level error type for CSL operations.
#[derive(Error, Debug)]
pub enum CslError {
    #[error("Unknown CSL type: \"{0}\"")]
    UnknownType(String),

    #[error("Cannot normalise {expected} from {found}")]
    UnsupportedInputType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Document does not conform to the CSL {kind} schema: {message}")]
    SchemaValidation { kind: SchemaKind, message: String },

    #[error("Key of mapping is not a string: {0}")]
    KeyType(String),

    #[error("Invalid date-parts: {0}")]
    InvalidDateParts(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CslError {
    /// Create an [`CslError::UnsupportedInputType`] error.
    pub(crate) fn unsupported(expected: &'static str, found: &'static str) -> Self {
        CslError::UnsupportedInputType { expected, found }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CslError>;

/// Errors raised by registry fetchers.
#[cfg(feature = "fetch")]
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Missing field {field} in response for {package}")]
    MissingField {
        package: String,
        field: &'static str,
    },

    #[error("Bad timestamp for {package}: \"{value}\"")]
    BadTimestamp { package: String, value: String },

    #[error(transparent)]
    Csl(#[from] CslError),
}
