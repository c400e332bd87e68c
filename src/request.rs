//! Package requests such as `requests==2.31.0` or `serde`.

use crate::regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

static REQUEST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w[\w.\-]*)\s*(?:([=><!~^]{1,3})\s*([\w.*\-]+))?$").unwrap()
});

/// A package to cite, optionally pinned to one version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRequest {
    pub name: String,
    pub version: Option<String>,
}

impl PackageRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for PackageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}=={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// Parse one requirement-style token.
///
/// Exact pins (`=`, `==`, `===`) keep their version. Any other relation
/// is accepted but the version is dropped, since only one release can be
/// cited. Tokens that are not package requests give `None`.
///
/// # Examples
///
/// ```
/// use pkgcite::parse_request;
///
/// let request = parse_request("numpy == 1.26.4").unwrap();
/// assert_eq!(request.name, "numpy");
/// assert_eq!(request.version.as_deref(), Some("1.26.4"));
///
/// assert_eq!(parse_request("numpy>=1.0").unwrap().version, None);
/// assert!(parse_request("not a package").is_none());
/// ```
pub fn parse_request(token: &str) -> Option<PackageRequest> {
    let token = token.trim();
    let Some(captures) = REQUEST_REGEX.captures(token) else {
        tracing::warn!(token, "ignoring invalid package request");
        return None;
    };
    let request = PackageRequest::new(&captures[1]);
    match (captures.get(2), captures.get(3)) {
        (Some(relation), Some(version)) if matches!(relation.as_str(), "=" | "==" | "===") => {
            Some(request.with_version(version.as_str()))
        }
        (Some(relation), Some(version)) => {
            tracing::warn!(
                package = %request.name,
                relation = relation.as_str(),
                version = version.as_str(),
                "only exact versions can be cited, using the latest release"
            );
            Some(request)
        }
        _ => Some(request),
    }
}

/// Parse newline-separated requests, skipping blank lines and `#` comments.
pub fn read_requests(text: &str) -> Vec<PackageRequest> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_request)
        .collect()
}

/// Parse `pip freeze` output into pinned requests.
///
/// Only `name==version` lines are kept. Editable installs, direct URL
/// references and comments are skipped without a warning.
///
/// # Examples
///
/// ```
/// use pkgcite::request::read_freeze;
///
/// let installed = read_freeze("numpy==1.26.4\n-e git+https://example.org/x#egg=x\n");
/// assert_eq!(installed.len(), 1);
/// assert_eq!(installed[0].version.as_deref(), Some("1.26.4"));
/// ```
pub fn read_freeze(text: &str) -> Vec<PackageRequest> {
    text.lines()
        .filter_map(|line| {
            let captures = REQUEST_REGEX.captures(line.trim())?;
            if captures.get(2)?.as_str() != "==" {
                return None;
            }
            Some(PackageRequest::new(&captures[1]).with_version(&captures[3]))
        })
        .collect()
}

/// Normalized form of a Python distribution name: lowercase, with runs of
/// `-`, `_` and `.` collapsed to one `-`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Pin unversioned requests to the versions in `installed`.
///
/// Names are compared in canonical form. Requests that already carry a
/// version, or that are not installed, are returned unchanged.
pub fn pin_installed(
    requests: Vec<PackageRequest>,
    installed: &[PackageRequest],
) -> Vec<PackageRequest> {
    let versions: HashMap<String, &str> = installed
        .iter()
        .filter_map(|r| Some((canonical_name(&r.name), r.version.as_deref()?)))
        .collect();
    requests
        .into_iter()
        .map(|request| {
            if request.version.is_some() {
                return request;
            }
            match versions.get(&canonical_name(&request.name)) {
                Some(&version) => {
                    tracing::debug!(package = %request.name, version, "using installed version");
                    request.with_version(version)
                }
                None => request,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("requests", "requests", None)]
    #[case("requests==2.31.0", "requests", Some("2.31.0"))]
    #[case("requests = 2.31.0", "requests", Some("2.31.0"))]
    #[case("requests===2.31.0", "requests", Some("2.31.0"))]
    #[case("zope.interface==6.0", "zope.interface", Some("6.0"))]
    #[case("typing_extensions", "typing_extensions", None)]
    #[case("  serde-json  ", "serde-json", None)]
    #[case("numpy>=1.26", "numpy", None)]
    #[case("numpy~=1.26", "numpy", None)]
    #[case("numpy != 1.2.*", "numpy", None)]
    #[case("serde^1", "serde", None)]
    #[case("numpy<2", "numpy", None)]
    fn test_parse_request(
        #[case] token: &str,
        #[case] name: &str,
        #[case] version: Option<&str>,
    ) {
        let request = parse_request(token).unwrap();
        assert_eq!(request.name, name);
        assert_eq!(request.version.as_deref(), version);
    }

    #[rstest]
    #[case("")]
    #[case("-e .")]
    #[case("git+https://github.com/psf/requests")]
    #[case("requests[security]")]
    #[case("numpy==")]
    #[case(".hidden")]
    fn test_parse_request_rejects(#[case] token: &str) {
        assert_eq!(parse_request(token), None);
    }

    #[test]
    fn test_read_requests() {
        let text = "# runtime\nrequests==2.31.0\n\n  numpy\n-e .\n# dev\npytest>=8\n";
        let requests = read_requests(text);
        assert_eq!(
            requests,
            vec![
                PackageRequest::new("requests").with_version("2.31.0"),
                PackageRequest::new("numpy"),
                PackageRequest::new("pytest"),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(PackageRequest::new("serde").to_string(), "serde");
        assert_eq!(
            PackageRequest::new("serde").with_version("1.0.0").to_string(),
            "serde==1.0.0"
        );
    }

    #[test]
    fn test_read_freeze() {
        let text = "\
Django==5.0.2
-e git+https://github.com/psf/requests@abc#egg=requests
certifi @ file:///tmp/certifi-2024.2.2-py3-none-any.whl
# Editable install with no version control (pkgcite==0.1.0)
zope.interface==6.2
broken==
";
        assert_eq!(
            read_freeze(text),
            vec![
                PackageRequest::new("Django").with_version("5.0.2"),
                PackageRequest::new("zope.interface").with_version("6.2"),
            ]
        );
    }

    #[rstest]
    #[case("requests", "requests")]
    #[case("Django", "django")]
    #[case("zope.interface", "zope-interface")]
    #[case("typing_extensions", "typing-extensions")]
    #[case("Foo__Bar-.baz", "foo-bar-baz")]
    fn test_canonical_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(canonical_name(name), expected);
    }

    #[test]
    fn test_pin_installed() {
        let installed = read_freeze("Django==5.0.2\ntyping_extensions==4.9.0\nnumpy==1.26.4\n");
        let requests = vec![
            PackageRequest::new("django"),
            PackageRequest::new("typing-extensions"),
            PackageRequest::new("numpy").with_version("2.0.0"),
            PackageRequest::new("requests"),
        ];
        assert_eq!(
            pin_installed(requests, &installed),
            vec![
                PackageRequest::new("django").with_version("5.0.2"),
                PackageRequest::new("typing-extensions").with_version("4.9.0"),
                PackageRequest::new("numpy").with_version("2.0.0"),
                PackageRequest::new("requests"),
            ]
        );
    }
}
