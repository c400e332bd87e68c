//! The citation item.
//!
//! An [`Item`] is one citable work: a required type and id plus optional
//! name lists, dates and scalar variables. Name and date fields accept the
//! loose inputs of [`crate::normalize`] through [`ItemBuilder`].

use crate::convert::{Value, field_error, unexpected_field};
use crate::error::{CslError, Result};
use crate::normalize::{DateInput, NameInput, normalize_date, normalize_name_list};
use crate::schema::SchemaKind;
use crate::{CslObject, CslType, Date, Name, NumOrStr};

/// Internal key of a field, for fields whose identifier is a keyword.
macro_rules! field_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $key:literal) => {
        $key
    };
}

macro_rules! csl_item {
    (
        names { $($name:ident),* $(,)? }
        dates { $($date:ident),* $(,)? }
        strings { $($string:ident $(as $string_key:literal)?),* $(,)? }
        numbers { $($number:ident),* $(,)? }
    ) => {
        /// A CSL citation item.
        ///
        /// Fields use internal names; [`CslObject::to_external`] renames
        /// them to CSL-JSON (`container_title` → `container-title`,
        /// `doi` → `DOI`).
        #[derive(Debug, Clone, PartialEq)]
        pub struct Item {
            /// The CSL `type`.
            pub kind: CslType,
            pub id: NumOrStr,
            pub categories: Option<Vec<String>>,
            $(pub $name: Option<Vec<Name>>,)*
            $(pub $date: Option<Date>,)*
            $(pub $string: Option<String>,)*
            $(pub $number: Option<NumOrStr>,)*
        }

        impl Item {
            /// Internal names of the fields holding a list of names.
            pub const NAME_FIELDS: &'static [&'static str] = &[$(stringify!($name)),*];

            /// Internal names of the fields holding a date.
            pub const DATE_FIELDS: &'static [&'static str] = &[$(stringify!($date)),*];

            /// An item with only `type` and `id` set.
            pub fn new(kind: CslType, id: impl Into<NumOrStr>) -> Self {
                Self {
                    kind,
                    id: id.into(),
                    categories: None,
                    $($name: None,)*
                    $($date: None,)*
                    $($string: None,)*
                    $($number: None,)*
                }
            }

            fn internal_entries(&self) -> Vec<(&'static str, Value)> {
                vec![
                    ("type", Value::Type(self.kind)),
                    ("id", self.id.clone().into()),
                    ("categories", self.categories.clone().into()),
                    $((stringify!($name), self.$name.clone().into()),)*
                    $((stringify!($date), self.$date.clone().into()),)*
                    $((field_key!($string $(, $string_key)?), self.$string.clone().into()),)*
                    $((stringify!($number), self.$number.clone().into()),)*
                ]
            }

            /// Set one optional field from its internal value.
            fn set_field(&mut self, key: &str, value: Value) -> Result<()> {
                const KIND: SchemaKind = SchemaKind::Item;
                if key == "categories" {
                    self.categories = value.into_strings(KIND, key)?;
                    return Ok(());
                }
                $(if key == stringify!($name) {
                    self.$name = match value {
                        Value::Null => None,
                        value => normalize_name_list(Some(NameInput::try_from(value)?))?,
                    };
                    return Ok(());
                })*
                $(if key == stringify!($date) {
                    self.$date = match value {
                        Value::Null => None,
                        value => normalize_date(Some(DateInput::try_from(value)?))?,
                    };
                    return Ok(());
                })*
                $(if key == field_key!($string $(, $string_key)?) {
                    self.$string = value.into_string(KIND, key)?;
                    return Ok(());
                })*
                $(if key == stringify!($number) {
                    self.$number = NumOrStr::from_value(value, KIND, key)?;
                    return Ok(());
                })*
                Err(unexpected_field(KIND, key))
            }
        }

        impl ItemBuilder {
            $(
                pub fn $name(mut self, names: impl Into<NameInput>) -> Self {
                    match normalize_name_list(Some(names.into())) {
                        Ok(names) => self.item.$name = names,
                        Err(e) => self.fail(e),
                    }
                    self
                }
            )*

            $(
                pub fn $date(mut self, date: impl Into<DateInput>) -> Self {
                    match normalize_date(Some(date.into())) {
                        Ok(date) => self.item.$date = date,
                        Err(e) => self.fail(e),
                    }
                    self
                }
            )*

            $(
                pub fn $string(mut self, value: impl Into<String>) -> Self {
                    self.item.$string = Some(value.into());
                    self
                }
            )*

            $(
                pub fn $number(mut self, value: impl Into<NumOrStr>) -> Self {
                    self.item.$number = Some(value.into());
                    self
                }
            )*
        }
    };
}

csl_item! {
    names {
        author,
        collection_editor,
        composer,
        container_author,
        director,
        editor,
        editorial_director,
        interviewer,
        illustrator,
        original_author,
        recipient,
        reviewed_author,
        translator,
    }
    dates {
        accessed,
        container,
        event_date,
        issued,
        original_date,
        submitted,
    }
    strings {
        language,
        journal_abbreviation,
        short_title,
        r#abstract as "abstract",
        annote,
        archive,
        archive_location,
        archive_place,
        authority,
        call_number,
        chapter_number,
        citation_number,
        citation_label,
        collection_number,
        collection_title,
        container_title,
        container_title_short,
        dimensions,
        doi,
        event,
        event_place,
        first_reference_note_number,
        genre,
        isbn,
        issn,
        jurisdiction,
        keyword,
        locator,
        medium,
        note,
        number_of_pages,
        original_publisher,
        original_publisher_place,
        original_title,
        page,
        page_first,
        pmcid,
        pmid,
        publisher,
        publisher_place,
        references,
        reviewed_title,
        scale,
        section,
        source,
        status,
        title,
        title_short,
        url,
        version,
    }
    numbers {
        edition,
        issue,
        number,
        number_of_volumes,
        volume,
        year_suffix,
    }
}

impl Item {
    /// Start building an item of the given type.
    pub fn builder(kind: CslType, id: impl Into<NumOrStr>) -> ItemBuilder {
        ItemBuilder {
            item: Item::new(kind, id),
            error: None,
        }
    }
}

/// Builder for [`Item`].
///
/// Name and date setters normalize their input immediately; the first
/// failure is kept and returned by [`ItemBuilder::build`].
#[derive(Debug)]
pub struct ItemBuilder {
    item: Item,
    error: Option<CslError>,
}

impl ItemBuilder {
    fn fail(&mut self, error: CslError) {
        self.error.get_or_insert(error);
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.item.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Finish the item, checking it against the item schema.
    ///
    /// # Errors
    ///
    /// Returns the first normalization error from a setter, or a schema
    /// error if the assembled item is invalid.
    pub fn build(self) -> Result<Item> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.item.to_external()?;
        Ok(self.item)
    }
}

fn missing_field(field: &str) -> CslError {
    CslError::SchemaValidation {
        kind: SchemaKind::Item,
        message: format!("missing required field `{}`", field),
    }
}

impl CslObject for Item {
    const KIND: SchemaKind = SchemaKind::Item;

    fn to_internal(&self) -> Value {
        Value::map(self.internal_entries())
    }

    fn from_internal(value: Value) -> Result<Self> {
        const KIND: SchemaKind = SchemaKind::Item;
        let mut kind = None;
        let mut id = None;
        let mut rest = Vec::new();
        for (key, value) in value.into_entries(KIND)? {
            match key.as_str() {
                "type" => {
                    kind = match value {
                        Value::Null => None,
                        Value::Type(t) => Some(t),
                        Value::String(s) => Some(s.parse()?),
                        other => return Err(field_error(KIND, &key, "a CSL type", &other)),
                    }
                }
                "id" => id = NumOrStr::from_value(value, KIND, &key)?,
                _ => rest.push((key, value)),
            }
        }
        let kind = kind.ok_or_else(|| missing_field("type"))?;
        let id = id.ok_or_else(|| missing_field("id"))?;
        let mut item = Item::new(kind, id);
        for (key, value) in rest {
            item.set_field(&key, value)?;
        }
        item.to_external()?;
        Ok(item)
    }
}

impl PartialEq<serde_json::Value> for Item {
    fn eq(&self, other: &serde_json::Value) -> bool {
        self.to_external().is_ok_and(|this| this == *other)
    }
}

impl PartialEq<str> for Item {
    fn eq(&self, other: &str) -> bool {
        self.matches_json(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flag;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_minimal_item_external() {
        let item = Item::new(CslType::Webpage, "requests");
        assert_eq!(
            item.to_external().unwrap(),
            json!({"type": "webpage", "id": "requests"})
        );
    }

    #[test]
    fn test_numeric_id() {
        let item = Item::new(CslType::Book, 42);
        assert_eq!(item.to_external().unwrap(), json!({"type": "book", "id": 42}));
    }

    #[test]
    fn test_builder_normalizes_inputs() {
        let item = Item::builder(CslType::Webpage, "numpy")
            .author(["Travis E. Oliphant", "NumPy Developers"])
            .issued(ymd(2024, 6, 16))
            .accessed((ymd(2024, 7, 1), ymd(2024, 7, 2)))
            .title("numpy")
            .container_title("PyPI")
            .url("https://pypi.org/project/numpy/")
            .categories(["software", "python"])
            .version("2.0.0")
            .build()
            .unwrap();

        assert_eq!(
            item.to_external().unwrap(),
            json!({
                "type": "webpage",
                "id": "numpy",
                "author": [
                    {"literal": "Travis E. Oliphant"},
                    {"literal": "NumPy Developers"},
                ],
                "issued": {"date-parts": [[2024, 6, 16]]},
                "accessed": {"date-parts": [[2024, 7, 1], [2024, 7, 2]]},
                "title": "numpy",
                "container-title": "PyPI",
                "URL": "https://pypi.org/project/numpy/",
                "categories": ["software", "python"],
                "version": "2.0.0",
            })
        );
    }

    #[test]
    fn test_builder_keeps_first_error() {
        let result = Item::builder(CslType::Webpage, "x")
            .author(Name::literal("ok"))
            .issued(vec![ymd(2020, 1, 1); 3])
            .build();
        assert!(matches!(
            result,
            Err(CslError::UnsupportedInputType { expected: "date", .. })
        ));
    }

    #[test]
    fn test_round_trip_full_item() {
        let document = json!({
            "type": "article-journal",
            "id": "doe2020",
            "author": [
                {"family": "Doe", "given": "Jane"},
                {"literal": "The Consortium"},
            ],
            "editor": [{"family": "Roe", "non-dropping-particle": "de"}],
            "issued": {"date-parts": [[2020, 3]]},
            "original-date": {"literal": "1901"},
            "title": "On things",
            "container-title": "Journal of Things",
            "container-title-short": "J. Things",
            "journalAbbreviation": "JoT",
            "DOI": "10.1000/xyz",
            "ISSN": "1234-5678",
            "volume": 12,
            "issue": "3",
            "page": "1-10",
            "abstract": "About things.",
            "original-publisher-place": "Berlin",
        });
        let item = Item::from_external(&document).unwrap();
        assert_eq!(item.kind, CslType::ArticleJournal);
        assert_eq!(item.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(item.container_title.as_deref(), Some("Journal of Things"));
        assert_eq!(item.container_title_short.as_deref(), Some("J. Things"));
        assert_eq!(item.r#abstract.as_deref(), Some("About things."));
        assert_eq!(item.volume, Some(NumOrStr::from(12)));
        assert_eq!(item.to_external().unwrap(), document);
        assert_eq!(Item::from_external(&item.to_external().unwrap()).unwrap(), item);
    }

    #[test]
    fn test_field_names_in_values_survive() {
        let item = Item::builder(CslType::Webpage, "url")
            .title("url")
            .author(Name::literal("doi"))
            .categories(["software", "url", "doi"])
            .build()
            .unwrap();
        let external = item.to_external().unwrap();
        assert_eq!(
            external,
            json!({
                "type": "webpage",
                "id": "url",
                "title": "url",
                "author": [{"literal": "doi"}],
                "categories": ["software", "url", "doi"],
            })
        );
        assert_eq!(Item::from_external(&external).unwrap(), item);

        let item = Item::from_external(&json!({"type": "book", "id": "URL", "title": "DOI"})).unwrap();
        assert_eq!(item.id, NumOrStr::from("URL"));
        assert_eq!(item.title.as_deref(), Some("DOI"));
    }

    #[test]
    fn test_single_author_object_is_wrapped() {
        let item = Item::from_external(&json!({
            "type": "webpage",
            "id": 1,
            "author": {"literal": "Python Software Foundation"},
        }))
        .unwrap();
        assert_eq!(
            item.author,
            Some(vec![Name::literal("Python Software Foundation")])
        );
    }

    #[rstest]
    #[case(json!({"type": "software", "id": "x"}))]
    #[case(json!({"type": 7, "id": "x"}))]
    fn test_unknown_type_fails(#[case] document: serde_json::Value) {
        assert!(matches!(
            Item::from_external(&document),
            Err(CslError::UnknownType(_))
        ));
    }

    #[rstest]
    #[case(json!({"id": "x"}), "`type`")]
    #[case(json!({"type": "book"}), "`id`")]
    #[case(json!({"type": "book", "id": "x", "publisher_name": "ACME"}), "`publisher_name`")]
    fn test_missing_or_unknown_fields(#[case] document: serde_json::Value, #[case] field: &str) {
        let Err(CslError::SchemaValidation { kind, message }) = Item::from_external(&document)
        else {
            panic!("expected a schema error");
        };
        assert_eq!(kind, SchemaKind::Item);
        assert!(message.contains(field), "{}", message);
    }

    #[test]
    fn test_wrong_scalar_shape_fails() {
        let result = Item::from_external(&json!({"type": "book", "id": "x", "title": ["a"]}));
        assert!(matches!(result, Err(CslError::SchemaValidation { .. })));
        let result = Item::from_external(&json!({"type": "book", "id": "x", "volume": true}));
        assert!(result.is_err());
    }

    #[test]
    fn test_compare_with_json() {
        let item = Item::builder(CslType::Book, "b")
            .author(Name {
                comma_suffix: Some(Flag::Bool(true)),
                ..Name::person("Doe", "Jane")
            })
            .build()
            .unwrap();
        let expected = json!({
            "type": "book",
            "id": "b",
            "author": [{"family": "Doe", "given": "Jane", "comma-suffix": true}],
        });
        assert!(item == expected);
        assert!(item == *expected.to_string().as_str());
        assert!(item != *"{not json");
        assert!(item != json!({"type": "book", "id": "c"}));
    }

    #[test]
    fn test_field_tables() {
        assert_eq!(Item::NAME_FIELDS.len(), 13);
        assert_eq!(Item::DATE_FIELDS.len(), 6);
        assert!(Item::NAME_FIELDS.contains(&"reviewed_author"));
        assert!(Item::DATE_FIELDS.contains(&"event_date"));
    }

    #[test]
    fn test_from_internal_accepts_loose_values() {
        let value = Value::map([
            ("type", Value::from("article_journal")),
            ("id", Value::from(5i64)),
            ("author", Value::from("Jane Doe")),
            ("issued", Value::List(vec![Value::List(vec![Value::from(1999i64)])])),
        ]);
        let item = Item::from_internal(value).unwrap();
        assert_eq!(item.kind, CslType::ArticleJournal);
        assert_eq!(item.author, Some(vec![Name::literal("Jane Doe")]));
        assert_eq!(
            item.issued.unwrap().to_external().unwrap(),
            json!({"date-parts": [[1999]]})
        );
    }
}
