use chrono::{DateTime, NaiveDateTime};
use reqwest::Url;

/// Sites every registry links to, keyed by a fragment of the host name.
pub(crate) const KNOWN_SITES: &[(&str, &str)] = &[
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("readthedocs", "ReadTheDocs"),
    ("bitbucket", "BitBucket"),
    ("joss", "The Journal of Open Source Software"),
    ("zenodo", "Zenodo"),
];

/// Guess the publisher of a URL from its host.
///
/// A host containing one of the `known_sites` keys gives that site's display
/// name; otherwise the host itself is used, without a leading `www.` label.
/// Returns `None` for text that is not an absolute URL with a host.
pub(crate) fn publisher_for_url(url: &str, known_sites: &[&[(&str, &str)]]) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let known = known_sites
        .iter()
        .flat_map(|sites| sites.iter())
        .find(|(key, _)| host.contains(key));
    if let Some((_, name)) = known {
        return Some(name.to_string());
    }
    match host.split_once('.') {
        Some((first, rest)) if first.starts_with("www") => Some(rest.to_string()),
        _ => Some(host),
    }
}

/// Parse a registry timestamp.
///
/// Accepts RFC 3339 (converted to UTC) and the offset-less ISO 8601 form
/// PyPI uses for `upload_time`.
pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// `None` for missing or blank text.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
