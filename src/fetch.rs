//! Registry fetchers.
//!
//! A [`Fetcher`] turns a [`PackageRequest`] into a citation [`Item`] by
//! querying a package registry's JSON API. [`fetch_all`] runs a fetcher
//! over many requests, optionally in parallel, keeping one result per
//! request so that a failing package does not affect the others.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use pkgcite::fetch::{FetchConfig, Fetcher, PypiFetcher};
//! use pkgcite::PackageRequest;
//!
//! let fetcher = PypiFetcher::new(&FetchConfig::default()).unwrap();
//! let today = Utc::now().date_naive();
//! let item = fetcher.fetch(&PackageRequest::new("requests"), today).unwrap();
//! println!("{}", item.title.unwrap_or_default());
//! ```

use crate::error::FetchError;
use crate::{Item, PackageRequest};
use chrono::NaiveDate;
use rayon::prelude::*;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

mod crates_io;
mod pypi;

pub use crates_io::CratesFetcher;
pub use pypi::PypiFetcher;

const USER_AGENT_VALUE: &str = concat!(
    "pkgcite/",
    env!("CARGO_PKG_VERSION"),
    " (citation metadata for software packages)"
);

/// Builds citation items from a package registry.
pub trait Fetcher: Send + Sync {
    /// Short registry name, used in logs.
    fn name(&self) -> &'static str;

    /// Fetch metadata for one package and build its citation item.
    ///
    /// # Arguments
    ///
    /// * `request` - The package, optionally pinned to a version
    /// * `accessed` - Date recorded as the item's `accessed` date
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the registry cannot be reached, does not
    /// know the package, or returns data that does not form a valid item.
    fn fetch(&self, request: &PackageRequest, accessed: NaiveDate) -> Result<Item, FetchError>;
}

/// Options shared by all fetchers.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Fetch packages concurrently in [`fetch_all`].
    pub parallel: bool,
    /// Timeout for each HTTP request.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// The registries a package can be cited from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Registry {
    #[default]
    Pypi,
    Crates,
}

impl Registry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Pypi => "pypi",
            Registry::Crates => "crates",
        }
    }

    /// A fetcher for this registry.
    pub fn fetcher(&self, config: &FetchConfig) -> Result<Box<dyn Fetcher>, FetchError> {
        let fetcher: Box<dyn Fetcher> = match self {
            Registry::Pypi => Box::new(PypiFetcher::new(config)?),
            Registry::Crates => Box::new(CratesFetcher::new(config)?),
        };
        Ok(fetcher)
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Registry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pypi" => Ok(Registry::Pypi),
            "crates" => Ok(Registry::Crates),
            other => Err(format!("unknown registry \"{}\", expected pypi or crates", other)),
        }
    }
}

/// Blocking JSON client shared by the fetchers.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub(crate) fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and decode the JSON body.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
    ) -> Result<T, FetchError> {
        tracing::debug!(url, "fetching");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(package.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.json()?;
        tracing::debug!(url, "parsed response");
        Ok(body)
    }
}

/// Fetch every request, keeping the outcome of each.
///
/// Results are returned in the order of `requests`. Failures are logged
/// and returned alongside their request rather than aborting the batch.
pub fn fetch_all(
    fetcher: &dyn Fetcher,
    requests: &[PackageRequest],
    accessed: NaiveDate,
    parallel: bool,
) -> Vec<(PackageRequest, Result<Item, FetchError>)> {
    let fetch_one = |request: &PackageRequest| {
        let result = fetcher.fetch(request, accessed);
        match &result {
            Ok(_) => tracing::info!(registry = fetcher.name(), package = %request, "fetched"),
            Err(e) => {
                tracing::warn!(registry = fetcher.name(), package = %request, error = %e, "fetch failed")
            }
        }
        (request.clone(), result)
    };

    if parallel {
        requests.par_iter().map(fetch_one).collect()
    } else {
        requests.iter().map(fetch_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CslType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Succeeds for names starting with a letter, fails otherwise.
    struct StubFetcher;

    impl Fetcher for StubFetcher {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn fetch(&self, request: &PackageRequest, accessed: NaiveDate) -> Result<Item, FetchError> {
            if !request.name.starts_with(char::is_alphabetic) {
                return Err(FetchError::NotFound(request.name.clone()));
            }
            Ok(Item::builder(CslType::Webpage, request.name.as_str())
                .title(request.name.as_str())
                .accessed(accessed)
                .build()?)
        }
    }

    fn requests() -> Vec<PackageRequest> {
        ["alpha", "1bad", "beta", "2bad", "gamma"]
            .into_iter()
            .map(|name| PackageRequest::new(name))
            .collect()
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_fetch_all_isolates_failures(#[case] parallel: bool) {
        let accessed = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let results = fetch_all(&StubFetcher, &requests(), accessed, parallel);

        let names: Vec<_> = results.iter().map(|(r, _)| r.name.as_str()).collect();
        assert_eq!(names, ["alpha", "1bad", "beta", "2bad", "gamma"]);

        let ok: Vec<_> = results
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(|item| item.title.clone().unwrap())
            .collect();
        assert_eq!(ok, ["alpha", "beta", "gamma"]);
        assert!(matches!(&results[1].1, Err(FetchError::NotFound(name)) if name == "1bad"));
    }

    #[test]
    fn test_registry_from_str() {
        assert_eq!("pypi".parse::<Registry>(), Ok(Registry::Pypi));
        assert_eq!("crates".parse::<Registry>(), Ok(Registry::Crates));
        assert!("cran".parse::<Registry>().is_err());
        assert_eq!(Registry::Crates.to_string(), "crates");
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert!(config.parallel);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT_VALUE.starts_with("pkgcite/"));
    }
}
