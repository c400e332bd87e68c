//! The Rust package registry, crates.io.

use super::{Fetcher, FetchConfig, HttpClient};
use crate::error::FetchError;
use crate::utils::{KNOWN_SITES, non_empty, parse_timestamp, publisher_for_url};
use crate::{CslType, Item, Name, PackageRequest};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

const BASE_URL: &str = "https://crates.io";

const CRATES_SITES: &[(&str, &str)] = &[("crates.io", "Crates.io"), ("docs.rs", "Docs.rs")];

const CATEGORIES: [&str; 4] = ["software", "rust", "libraries", "crates"];

#[derive(Debug, Deserialize)]
pub(crate) struct CratesResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
    /// Newest first.
    #[serde(default)]
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    name: String,
    description: Option<String>,
    homepage: Option<String>,
    max_version: String,
    created_at: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    created_at: String,
    published_by: Option<CrateUser>,
}

#[derive(Debug, Deserialize)]
struct CrateUser {
    login: String,
    name: Option<String>,
}

impl CrateUser {
    fn to_name(&self) -> Name {
        Name::literal(non_empty(self.name.clone()).unwrap_or_else(|| self.login.clone()))
    }
}

/// Fetches crate metadata from the crates.io API.
#[derive(Debug, Clone)]
pub struct CratesFetcher {
    client: HttpClient,
    base_url: String,
}

impl CratesFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, name: &str) -> String {
        format!("{}/api/v1/crates/{}", self.base_url, name)
    }
}

impl Fetcher for CratesFetcher {
    fn name(&self) -> &'static str {
        "crates"
    }

    fn fetch(&self, request: &PackageRequest, accessed: NaiveDate) -> Result<Item, FetchError> {
        let response: CratesResponse = self.client.get_json(&self.api_url(&request.name), &request.name)?;
        item_from_response(request, response, accessed)
    }
}

fn timestamp(package: &str, value: &str) -> Result<NaiveDateTime, FetchError> {
    parse_timestamp(value).ok_or_else(|| FetchError::BadTimestamp {
        package: package.to_string(),
        value: value.to_string(),
    })
}

/// Build a citation item from a crates.io crate response.
pub(crate) fn item_from_response(
    request: &PackageRequest,
    response: CratesResponse,
    accessed: NaiveDate,
) -> Result<Item, FetchError> {
    let package = request.name.as_str();
    let CratesResponse { krate, versions } = response;

    let url = non_empty(krate.homepage).unwrap_or_else(|| match &request.version {
        Some(version) => format!("https://crates.io/crates/{}/{}", package, version),
        None => format!("https://crates.io/crates/{}", package),
    });
    let publisher = publisher_for_url(&url, &[KNOWN_SITES, CRATES_SITES]);

    let version = request.version.clone().unwrap_or(krate.max_version);
    let Some(release) = versions.iter().find(|v| v.num == version) else {
        return Err(FetchError::NotFound(format!("{}=={}", package, version)));
    };
    let issued = timestamp(package, &release.created_at)?;
    let author = release.published_by.as_ref().map(CrateUser::to_name);
    let original_author = versions
        .last()
        .and_then(|oldest| oldest.published_by.as_ref())
        .map(CrateUser::to_name);
    let original_date = timestamp(package, &krate.created_at)?;

    let categories = CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .chain(krate.keywords)
        .chain(krate.categories);

    let mut builder = Item::builder(CslType::Webpage, package)
        .title(krate.name)
        .url(url)
        .version(version.as_str())
        .issued(issued)
        .original_date(original_date)
        .accessed(accessed)
        .categories(categories);
    if let Some(author) = author {
        builder = builder.author(author);
    }
    if let Some(original_author) = original_author {
        builder = builder.original_author(original_author);
    }
    if let Some(description) = non_empty(krate.description) {
        builder = builder.r#abstract(description.trim());
    }
    if let Some(publisher) = publisher {
        builder = builder.publisher(publisher);
    }
    Ok(builder.build()?)
}
