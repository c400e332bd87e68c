//! The Python Package Index.

use super::{Fetcher, FetchConfig, HttpClient};
use crate::error::FetchError;
use crate::utils::{KNOWN_SITES, non_empty, parse_timestamp, publisher_for_url};
use crate::{CslType, Item, Name, PackageRequest};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;

const BASE_URL: &str = "https://pypi.org/pypi";

const PYPI_SITES: &[(&str, &str)] = &[("pypi", "The Python Package Index")];

const CATEGORIES: [&str; 4] = ["software", "python", "libraries", "pypi"];

#[derive(Debug, Deserialize)]
pub(crate) struct PypiResponse {
    info: PypiInfo,
    /// Upload history of every release. Absent from version-specific
    /// responses.
    #[serde(default)]
    releases: HashMap<String, Vec<PypiUpload>>,
    /// Files of the version described by `info`.
    #[serde(default)]
    urls: Vec<PypiUpload>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    author: Option<String>,
    maintainer: Option<String>,
    home_page: Option<String>,
    project_url: Option<String>,
    summary: Option<String>,
    version: String,
    #[serde(default)]
    classifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PypiUpload {
    upload_time: String,
}

/// Fetches package metadata from PyPI's JSON API.
#[derive(Debug, Clone)]
pub struct PypiFetcher {
    client: HttpClient,
    base_url: String,
}

impl PypiFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: HttpClient::new(config)?,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Use a mirror instead of pypi.org.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, request: &PackageRequest) -> String {
        match &request.version {
            Some(version) => format!("{}/{}/{}/json", self.base_url, request.name, version),
            None => format!("{}/{}/json", self.base_url, request.name),
        }
    }
}

impl Fetcher for PypiFetcher {
    fn name(&self) -> &'static str {
        "pypi"
    }

    fn fetch(&self, request: &PackageRequest, accessed: NaiveDate) -> Result<Item, FetchError> {
        let response: PypiResponse = self.client.get_json(&self.url(request), &request.name)?;
        if let Some(version) = &request.version
            && *version != response.info.version
        {
            tracing::warn!(
                package = %request.name,
                requested = %version,
                found = %response.info.version,
                "registry returned a different version"
            );
        }
        item_from_response(&request.name, response, accessed)
    }
}

fn upload_time(package: &str, upload: &PypiUpload) -> Result<NaiveDateTime, FetchError> {
    parse_timestamp(&upload.upload_time).ok_or_else(|| FetchError::BadTimestamp {
        package: package.to_string(),
        value: upload.upload_time.clone(),
    })
}

/// Earliest upload time among `uploads`.
fn first_upload<'a>(
    package: &str,
    uploads: impl IntoIterator<Item = &'a PypiUpload>,
) -> Result<Option<NaiveDateTime>, FetchError> {
    let mut first: Option<NaiveDateTime> = None;
    for upload in uploads {
        let time = upload_time(package, upload)?;
        first = Some(first.map_or(time, |f| f.min(time)));
    }
    Ok(first)
}

/// Build a citation item from a PyPI JSON response.
pub(crate) fn item_from_response(
    package: &str,
    response: PypiResponse,
    accessed: NaiveDate,
) -> Result<Item, FetchError> {
    let PypiResponse {
        info,
        releases,
        urls,
    } = response;

    let release_files = releases.get(&info.version).filter(|files| !files.is_empty());
    let issued = match release_files {
        Some(files) => first_upload(package, files)?,
        None => first_upload(package, &urls)?,
    };
    let original_date = first_upload(package, releases.values().flatten())?
        .into_iter()
        .chain(issued)
        .min();
    if issued.is_none() {
        tracing::warn!(package, version = %info.version, "release has no uploaded files");
    }

    let url = non_empty(info.home_page)
        .or(non_empty(info.project_url))
        .unwrap_or_else(|| format!("https://pypi.org/project/{}/", package));
    let publisher = publisher_for_url(&url, &[KNOWN_SITES, PYPI_SITES]);
    let author = non_empty(info.author).or(non_empty(info.maintainer));

    let categories = CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .chain(info.classifiers);

    let mut builder = Item::builder(CslType::Webpage, package)
        .title(package)
        .url(url)
        .version(info.version)
        .accessed(accessed)
        .categories(categories);
    if let Some(author) = author {
        builder = builder.author(Name::literal(author));
    }
    if let Some(summary) = non_empty(info.summary) {
        builder = builder.r#abstract(summary);
    }
    if let Some(issued) = issued {
        builder = builder.issued(issued);
    }
    if let Some(original_date) = original_date {
        builder = builder.original_date(original_date);
    }
    if let Some(publisher) = publisher {
        builder = builder.publisher(publisher);
    }
    Ok(builder.build()?)
}
