//! Field name mapping between CSL-JSON and internal identifiers.
//!
//! CSL-JSON spells most multi-word variables with hyphens, a few in
//! camelCase, and the identifier variables in capitals. Internally every
//! identifier is snake_case. Names absent from the table are the same in
//! both spellings and pass through unchanged.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Item type tags that CSL-JSON hyphenates. These are the only string
/// values the converter renames.
pub(crate) const TYPE_TAGS: &[(&str, &str)] = &[
    ("article-journal", "article_journal"),
    ("article-magazine", "article_magazine"),
    ("article-newspaper", "article_newspaper"),
    ("entry-dictionary", "entry_dictionary"),
    ("entry-encyclopedia", "entry_encyclopedia"),
    ("paper-conference", "paper_conference"),
    ("post-weblog", "post_weblog"),
    ("review-book", "review_book"),
];

/// External (CSL-JSON) field name to internal name.
pub(crate) const FIELD_NAMES: &[(&str, &str)] = &[
    // name variables
    ("dropping-particle", "dropping_particle"),
    ("non-dropping-particle", "non_dropping_particle"),
    ("comma-suffix", "comma_suffix"),
    ("static-ordering", "static_ordering"),
    ("parse-names", "parse_names"),
    // camelCase
    ("journalAbbreviation", "journal_abbreviation"),
    ("shortTitle", "short_title"),
    // identifiers
    ("DOI", "doi"),
    ("ISBN", "isbn"),
    ("ISSN", "issn"),
    ("PMCID", "pmcid"),
    ("PMID", "pmid"),
    ("URL", "url"),
    // name-list fields
    ("collection-editor", "collection_editor"),
    ("container-author", "container_author"),
    ("editorial-director", "editorial_director"),
    ("original-author", "original_author"),
    ("reviewed-author", "reviewed_author"),
    // date fields
    ("event-date", "event_date"),
    ("original-date", "original_date"),
    ("date-parts", "date_parts"),
    // scalar fields
    ("archive-location", "archive_location"),
    ("archive-place", "archive_place"),
    ("call-number", "call_number"),
    ("chapter-number", "chapter_number"),
    ("citation-number", "citation_number"),
    ("citation-label", "citation_label"),
    ("collection-number", "collection_number"),
    ("collection-title", "collection_title"),
    ("container-title", "container_title"),
    ("container-title-short", "container_title_short"),
    ("event-place", "event_place"),
    ("first-reference-note-number", "first_reference_note_number"),
    ("number-of-pages", "number_of_pages"),
    ("number-of-volumes", "number_of_volumes"),
    ("original-publisher", "original_publisher"),
    ("original-publisher-place", "original_publisher_place"),
    ("original-title", "original_title"),
    ("page-first", "page_first"),
    ("publisher-place", "publisher_place"),
    ("reviewed-title", "reviewed_title"),
    ("title-short", "title_short"),
    ("year-suffix", "year_suffix"),
];

fn inverted(table: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
    table.iter().map(|&(external, internal)| (internal, external)).collect()
}

static TO_INTERNAL: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| FIELD_NAMES.iter().copied().collect());

static TO_EXTERNAL: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| inverted(FIELD_NAMES));

static VALUE_TO_INTERNAL: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| TYPE_TAGS.iter().copied().collect());

static VALUE_TO_EXTERNAL: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| inverted(TYPE_TAGS));

/// Map an internal field name to its CSL-JSON spelling.
///
/// # Examples
///
/// ```
/// assert_eq!(pkgcite::fields::to_external("container_title"), "container-title");
/// assert_eq!(pkgcite::fields::to_external("title"), "title");
/// ```
pub fn to_external(internal: &str) -> &str {
    TO_EXTERNAL.get(internal).copied().unwrap_or(internal)
}

/// Map a CSL-JSON field name to its internal identifier.
///
/// # Examples
///
/// ```
/// assert_eq!(pkgcite::fields::to_internal("DOI"), "doi");
/// assert_eq!(pkgcite::fields::to_internal("x-custom"), "x-custom");
/// ```
pub fn to_internal(external: &str) -> &str {
    TO_INTERNAL.get(external).copied().unwrap_or(external)
}

/// Map an internal string value to CSL-JSON. Only type tags change.
///
/// # Examples
///
/// ```
/// assert_eq!(pkgcite::fields::value_to_external("post_weblog"), "post-weblog");
/// assert_eq!(pkgcite::fields::value_to_external("url"), "url");
/// ```
pub fn value_to_external(internal: &str) -> &str {
    VALUE_TO_EXTERNAL.get(internal).copied().unwrap_or(internal)
}

/// Map a CSL-JSON string value to its internal spelling. Only type tags
/// change.
pub fn value_to_internal(external: &str) -> &str {
    VALUE_TO_INTERNAL.get(external).copied().unwrap_or(external)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_table_is_a_bijection() {
        assert_eq!(TO_INTERNAL.len(), FIELD_NAMES.len());
        assert_eq!(TO_EXTERNAL.len(), FIELD_NAMES.len());
        for &(external, internal) in FIELD_NAMES {
            assert_eq!(to_internal(to_external(internal)), internal);
            assert_eq!(to_external(to_internal(external)), external);
        }
    }

    #[rstest]
    #[case("non-dropping-particle", "non_dropping_particle")]
    #[case("journalAbbreviation", "journal_abbreviation")]
    #[case("shortTitle", "short_title")]
    #[case("URL", "url")]
    #[case("event-date", "event_date")]
    #[case("date-parts", "date_parts")]
    fn test_mapping(#[case] external: &str, #[case] internal: &str) {
        assert_eq!(to_internal(external), internal);
        assert_eq!(to_external(internal), external);
    }

    #[test]
    fn test_tables_are_disjoint() {
        for &(external, internal) in TYPE_TAGS {
            assert!(!TO_INTERNAL.contains_key(external));
            assert!(!TO_EXTERNAL.contains_key(internal));
        }
        assert_eq!(VALUE_TO_INTERNAL.len(), TYPE_TAGS.len());
        assert_eq!(VALUE_TO_EXTERNAL.len(), TYPE_TAGS.len());
    }

    #[rstest]
    #[case("article-journal", "article_journal")]
    #[case("review-book", "review_book")]
    fn test_type_tag_values(#[case] external: &str, #[case] internal: &str) {
        assert_eq!(value_to_internal(external), internal);
        assert_eq!(value_to_external(internal), external);
    }

    /// Field names used as ordinary text must not be renamed.
    #[rstest]
    #[case("url")]
    #[case("URL")]
    #[case("doi")]
    #[case("DOI")]
    #[case("isbn")]
    #[case("container_title")]
    #[case("title-short")]
    fn test_field_names_are_not_values(#[case] text: &str) {
        assert_eq!(value_to_external(text), text);
        assert_eq!(value_to_internal(text), text);
    }

    #[test]
    fn test_unknown_names_pass_through() {
        assert_eq!(to_internal("custom-field"), "custom-field");
        assert_eq!(to_external("custom_field"), "custom_field");
        assert_eq!(to_internal("title"), "title");
    }

    /// `container-title` once mapped to `container_title_short`, which made
    /// the two container title variables swap on a round trip.
    #[test]
    fn test_container_title_mapping_is_not_crossed() {
        assert_eq!(to_internal("container-title"), "container_title");
        assert_eq!(to_internal("container-title-short"), "container_title_short");
        assert_eq!(to_external("container_title"), "container-title");
        assert_eq!(to_external("container_title_short"), "container-title-short");
    }
}
