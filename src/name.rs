//! Personal and organizational names.

use crate::convert::{Value, unexpected_field};
use crate::error::Result;
use crate::schema::SchemaKind;
use crate::{CslObject, Flag};

/// A CSL name variable.
///
/// A name is either a `literal` (an organization, or a person whose name
/// should not be parsed) or a structured name split into particles. Both
/// may be present; `literal` wins when rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Name {
    pub family: Option<String>,
    pub given: Option<String>,
    pub dropping_particle: Option<String>,
    pub non_dropping_particle: Option<String>,
    pub suffix: Option<String>,
    pub comma_suffix: Option<Flag>,
    pub static_ordering: Option<Flag>,
    pub literal: Option<String>,
    pub parse_names: Option<Flag>,
}

impl Name {
    /// A name that is rendered verbatim.
    pub fn literal(literal: impl Into<String>) -> Self {
        Self {
            literal: Some(literal.into()),
            ..Self::default()
        }
    }

    /// A structured personal name.
    pub fn person(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            given: Some(given.into()),
            ..Self::default()
        }
    }

    /// Whether any structured part is set.
    pub fn is_structured(&self) -> bool {
        self.family.is_some()
            || self.given.is_some()
            || self.dropping_particle.is_some()
            || self.non_dropping_particle.is_some()
            || self.suffix.is_some()
    }

    /// The name in display order, preferring `literal`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pkgcite::Name;
    ///
    /// let name = Name {
    ///     family: Some("Gogh".to_string()),
    ///     given: Some("Vincent".to_string()),
    ///     non_dropping_particle: Some("van".to_string()),
    ///     ..Name::default()
    /// };
    /// assert_eq!(name.display(), "Vincent van Gogh");
    /// assert_eq!(Name::literal("Python Software Foundation").display(), "Python Software Foundation");
    /// ```
    pub fn display(&self) -> String {
        if let Some(literal) = &self.literal {
            return literal.clone();
        }
        let parts = [
            &self.given,
            &self.dropping_particle,
            &self.non_dropping_particle,
            &self.family,
        ];
        let mut out = parts
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(suffix) = &self.suffix {
            out.push_str(", ");
            out.push_str(suffix);
        }
        out
    }
}

impl CslObject for Name {
    const KIND: SchemaKind = SchemaKind::Name;

    fn to_internal(&self) -> Value {
        Value::map([
            ("family", self.family.clone().into()),
            ("given", self.given.clone().into()),
            ("dropping_particle", self.dropping_particle.clone().into()),
            ("non_dropping_particle", self.non_dropping_particle.clone().into()),
            ("suffix", self.suffix.clone().into()),
            ("comma_suffix", self.comma_suffix.clone().into()),
            ("static_ordering", self.static_ordering.clone().into()),
            ("literal", self.literal.clone().into()),
            ("parse_names", self.parse_names.clone().into()),
        ])
    }

    fn from_internal(value: Value) -> Result<Self> {
        const KIND: SchemaKind = SchemaKind::Name;
        let mut name = Name::default();
        for (key, value) in value.into_entries(KIND)? {
            match key.as_str() {
                "family" => name.family = value.into_string(KIND, &key)?,
                "given" => name.given = value.into_string(KIND, &key)?,
                "dropping_particle" => name.dropping_particle = value.into_string(KIND, &key)?,
                "non_dropping_particle" => {
                    name.non_dropping_particle = value.into_string(KIND, &key)?
                }
                "suffix" => name.suffix = value.into_string(KIND, &key)?,
                "comma_suffix" => name.comma_suffix = Flag::from_value(value, KIND, &key)?,
                "static_ordering" => name.static_ordering = Flag::from_value(value, KIND, &key)?,
                "literal" => name.literal = value.into_string(KIND, &key)?,
                "parse_names" => name.parse_names = Flag::from_value(value, KIND, &key)?,
                _ => return Err(unexpected_field(KIND, &key)),
            }
        }
        name.to_external()?;
        Ok(name)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}
