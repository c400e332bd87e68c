//! Reading and writing CSL-JSON documents.

use crate::error::{CslError, Result};
use crate::{CslObject, Item};
use serde_json::{Map, Value as Json};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

/// Layout of a written CSL-JSON document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One compact item object per line.
    Lines,
    /// An array indented by two spaces.
    #[default]
    Pretty,
    /// A compact array.
    Minified,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::Lines,
        OutputFormat::Pretty,
        OutputFormat::Minified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Lines => "csl-json/lines",
            OutputFormat::Pretty => "csl-json/pretty",
            OutputFormat::Minified => "csl-json/min",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown output format: \"{0}\"")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Rebuild objects with their keys in sorted order.
fn sorted(value: Json) -> Json {
    match value {
        Json::Array(items) => Json::Array(items.into_iter().map(sorted).collect()),
        Json::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Json::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sorted(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        other => other,
    }
}

/// Write items as a CSL-JSON document.
///
/// # Errors
///
/// Returns schema errors for invalid items and [`CslError::Io`] for
/// write failures.
///
/// # Examples
///
/// ```
/// use pkgcite::{CslType, Item, OutputFormat, write_items};
///
/// let items = [Item::new(CslType::Webpage, "serde")];
/// let mut out = Vec::new();
/// write_items(&items, OutputFormat::Minified, &mut out).unwrap();
/// assert_eq!(out, b"[{\"id\":\"serde\",\"type\":\"webpage\"}]\n");
/// ```
pub fn write_items<W: Write>(items: &[Item], format: OutputFormat, mut writer: W) -> Result<()> {
    let documents: Vec<Json> = items
        .iter()
        .map(|item| item.to_external().map(sorted))
        .collect::<Result<_>>()?;
    tracing::debug!(count = documents.len(), %format, "writing items");

    match format {
        OutputFormat::Lines => {
            for document in &documents {
                serde_json::to_writer(&mut writer, document)?;
                writer.write_all(b"\n")?;
            }
        }
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, &documents)?;
            writer.write_all(b"\n")?;
        }
        OutputFormat::Minified => {
            serde_json::to_writer(&mut writer, &documents)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read items from a CSL-JSON document.
///
/// Accepts an array of items, a single item object, or one item object per
/// line, in any of the layouts [`write_items`] produces.
pub fn read_items(text: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    for value in serde_json::Deserializer::from_str(text).into_iter::<Json>() {
        match value? {
            Json::Array(documents) => {
                for document in &documents {
                    items.push(Item::from_external(document)?);
                }
            }
            document @ Json::Object(_) => items.push(Item::from_external(&document)?),
            Json::Null => return Err(CslError::unsupported("item", "null")),
            Json::Bool(_) => return Err(CslError::unsupported("item", "boolean")),
            Json::Number(_) => return Err(CslError::unsupported("item", "number")),
            Json::String(_) => return Err(CslError::unsupported("item", "string")),
        }
    }
    Ok(items)
}
