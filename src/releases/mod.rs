//! Remote release catalog.
//!
//! Aggregate releases are published on GitHub. This module fetches the
//! release list, decodes it into strongly-typed [`Release`] values and ranks
//! the installable ones newest first.
//!
//! Decoding is strict about the fields the tool relies on (`tag_name`,
//! `prerelease`, `draft`, `published_at`) and fails the whole fetch with a
//! single [`AggregateError::DecodeError`] when one is missing or mistyped. A
//! tag that doesn't follow the version grammar is not a decoding failure: the
//! release gets a legacy version and is filtered out by [`Release::is_updateable`].

pub mod package;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;

use crate::constants::{
    CATALOG_TIMEOUT, GITHUB_ACCEPT, MIN_UPDATEABLE_MAJOR, RELEASES_ENDPOINT,
    RELEASES_ENDPOINT_ENV, USER_AGENT,
};
use crate::core::AggregateError;
use crate::version::VersionCode;

/// One published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    tag: String,
    version: VersionCode,
    published_at: DateTime<Utc>,
    draft: bool,
    pre_release: bool,
}

/// Wire shape of a release object; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawRelease {
    tag_name: String,
    prerelease: bool,
    draft: bool,
    published_at: DateTime<Utc>,
}

impl From<RawRelease> for Release {
    fn from(raw: RawRelease) -> Self {
        let version = VersionCode::parse_or_legacy(&raw.tag_name);
        Self {
            tag: raw.tag_name,
            version,
            published_at: raw.published_at,
            draft: raw.draft,
            pre_release: raw.prerelease,
        }
    }
}

impl Release {
    pub fn new(
        tag: impl Into<String>,
        published_at: DateTime<Utc>,
        draft: bool,
        pre_release: bool,
    ) -> Self {
        let tag = tag.into();
        let version = VersionCode::parse_or_legacy(&tag);
        Self {
            tag,
            version,
            published_at,
            draft,
            pre_release,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub const fn version(&self) -> &VersionCode {
        &self.version
    }

    pub const fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub const fn is_draft(&self) -> bool {
        self.draft
    }

    /// Pre-release flag as reported by the catalog.
    pub const fn is_pre_release(&self) -> bool {
        self.pre_release
    }

    /// Whether this tool can install the release: the tag parses and the
    /// major version is at least 2.
    pub fn is_updateable(&self) -> bool {
        !self.version.is_legacy() && self.version.major() >= MIN_UPDATEABLE_MAJOR
    }

    pub fn is_version(&self, version: &VersionCode) -> bool {
        &self.version == version
    }

    /// URL of the release's WAR package.
    pub fn download_url(&self) -> String {
        self.version.download_url()
    }
}

/// Decodes a catalog response body.
pub fn decode_releases(body: &str) -> Result<Vec<Release>> {
    let raw: Vec<RawRelease> =
        serde_json::from_str(body).map_err(|e| AggregateError::DecodeError {
            reason: e.to_string(),
        })?;
    Ok(raw.into_iter().map(Release::from).collect())
}

/// Keeps the installable releases, optionally dropping pre-releases, and
/// sorts them newest first.
pub fn rank(releases: Vec<Release>, include_pre_releases: bool) -> Vec<Release> {
    let mut ranked: Vec<Release> = releases
        .into_iter()
        .filter(Release::is_updateable)
        .filter(|release| include_pre_releases || !release.is_pre_release())
        .collect();
    ranked.sort_by(|a, b| b.version.cmp(&a.version));
    ranked
}

/// Anything able to produce a ranked list of releases.
pub trait ReleaseSource: Send + Sync {
    /// Installable releases, newest first.
    fn fetch(&self, include_pre_releases: bool)
    -> impl Future<Output = Result<Vec<Release>>> + Send;

    /// The newest installable release.
    ///
    /// # Errors
    ///
    /// [`AggregateError::NoReleasesFound`] when no release qualifies.
    fn latest(&self, include_pre_releases: bool) -> impl Future<Output = Result<Release>> + Send {
        async move {
            self.fetch(include_pre_releases)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::Error::from(AggregateError::NoReleasesFound))
        }
    }
}

/// Release catalog backed by the GitHub releases API.
#[derive(Debug, Clone)]
pub struct ReleaseCatalog {
    client: reqwest::Client,
    endpoint: String,
}

impl ReleaseCatalog {
    /// Catalog querying the public endpoint, or the URL in
    /// `AGGREGATE_CLI_RELEASES_URL` when set.
    pub fn new() -> Result<Self> {
        let endpoint = std::env::var(RELEASES_ENDPOINT_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| RELEASES_ENDPOINT.to_string());
        Self::with_endpoint(endpoint)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CATALOG_TIMEOUT)
            .timeout(CATALOG_TIMEOUT)
            .build()
            .map_err(|e| AggregateError::NetworkError {
                operation: "Building the HTTP client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_all(&self) -> Result<Vec<Release>> {
        let network_error = |reason: String| AggregateError::NetworkError {
            operation: format!("Querying available releases at {}", self.endpoint),
            reason,
        };

        tracing::debug!("GET {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| network_error(e.to_string()))?;

        if let Some(remaining) = response.headers().get("x-ratelimit-remaining")
            && let Ok(remaining) = remaining.to_str()
            && let Ok(remaining) = remaining.parse::<u32>()
            && remaining < 10
        {
            tracing::warn!("GitHub rate limit low: {remaining} remaining");
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(network_error(format!("HTTP {status}: {}", body.trim())).into());
        }

        let body = response.text().await.map_err(|e| network_error(e.to_string()))?;
        let releases = decode_releases(&body)?;
        tracing::debug!("Catalog returned {} releases", releases.len());
        Ok(releases)
    }
}

impl ReleaseSource for ReleaseCatalog {
    async fn fetch(&self, include_pre_releases: bool) -> Result<Vec<Release>> {
        let releases = self.fetch_all().await?;
        Ok(rank(releases, include_pre_releases))
    }
}
