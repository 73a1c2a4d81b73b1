//! Target version selection.
//!
//! A [`VersionIntent`] captures what the user asked for: a custom build
//! (version plus package URL), an explicit version from the catalog, or
//! nothing in particular. [`VersionSelector::resolve`] turns it into exactly
//! one [`ResolvedTarget`] by trying each resolver in priority order,
//! custom first, then requested, then latest, and keeping the first one that
//! produces a target.
//!
//! The catalog is fetched lazily, at most once per resolution, so a custom
//! build never touches the network.

use anyhow::Result;
use std::fmt;
use strsim::levenshtein;

use crate::core::AggregateError;
use crate::releases::{Release, ReleaseSource};
use crate::version::VersionCode;

/// Maximum Levenshtein distance, as a percentage of the requested literal's
/// length, for an available version to be suggested.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// A caller-supplied package bypassing the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBuild {
    pub version: VersionCode,
    pub url: String,
}

/// What the user asked to deploy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIntent {
    custom: Option<CustomBuild>,
    requested: Option<VersionCode>,
    include_pre_releases: bool,
}

impl VersionIntent {
    /// The newest available release.
    pub fn latest(include_pre_releases: bool) -> Self {
        Self {
            include_pre_releases,
            ..Self::default()
        }
    }

    /// Adds a custom build from the `--custom-version`/`--custom-url` pair.
    ///
    /// A blank URL counts as absent. Both absent leaves the intent unchanged.
    ///
    /// # Errors
    ///
    /// [`AggregateError::MissingPairedArgument`] when only one half is given.
    pub fn with_custom(mut self, version: Option<VersionCode>, url: Option<String>) -> Result<Self> {
        let url = url.filter(|url| !url.trim().is_empty());
        self.custom = match (version, url) {
            (Some(version), Some(url)) => Some(CustomBuild {
                version,
                url,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(AggregateError::MissingPairedArgument {
                    provided: "--custom-version".to_string(),
                    missing: "--custom-url".to_string(),
                }
                .into());
            }
            (None, Some(_)) => {
                return Err(AggregateError::MissingPairedArgument {
                    provided: "--custom-url".to_string(),
                    missing: "--custom-version".to_string(),
                }
                .into());
            }
        };
        Ok(self)
    }

    /// Requires a specific version from the catalog.
    #[must_use]
    pub fn with_requested(mut self, requested: Option<VersionCode>) -> Self {
        self.requested = requested;
        self
    }

    pub const fn include_pre_releases(&self) -> bool {
        self.include_pre_releases
    }

    pub const fn custom(&self) -> Option<&CustomBuild> {
        self.custom.as_ref()
    }

    pub const fn requested(&self) -> Option<&VersionCode> {
        self.requested.as_ref()
    }
}

/// Which resolver produced a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOrigin {
    Custom,
    Requested,
    Latest,
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Custom => "custom build",
            Self::Requested => "requested version",
            Self::Latest => "latest release",
        })
    }
}

/// The version to deploy and where to download it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub version: VersionCode,
    pub download_url: String,
    pub origin: TargetOrigin,
}

impl ResolvedTarget {
    fn from_release(release: &Release, origin: TargetOrigin) -> Self {
        Self {
            version: release.version().clone(),
            download_url: release.download_url(),
            origin,
        }
    }
}

/// Resolvers in priority order.
const RESOLUTION_ORDER: [TargetOrigin; 3] =
    [TargetOrigin::Custom, TargetOrigin::Requested, TargetOrigin::Latest];

/// Resolves a [`VersionIntent`] against a release source.
pub struct VersionSelector<'a, S> {
    source: &'a S,
}

impl<'a, S: ReleaseSource> VersionSelector<'a, S> {
    pub const fn new(source: &'a S) -> Self {
        Self {
            source,
        }
    }

    /// Picks the target for `intent`.
    ///
    /// # Errors
    ///
    /// - [`AggregateError::RequestedVersionUnavailable`] when the requested
    ///   version isn't in the catalog
    /// - [`AggregateError::NoReleasesFound`] when no resolver applies
    /// - catalog fetch errors
    pub async fn resolve(&self, intent: &VersionIntent) -> Result<ResolvedTarget> {
        let mut catalog: Option<Vec<Release>> = None;

        for origin in RESOLUTION_ORDER {
            if let Some(target) = self.try_resolve(origin, intent, &mut catalog).await? {
                tracing::debug!(
                    "Resolved {} from the {} ({})",
                    target.version,
                    target.origin,
                    target.download_url
                );
                return Ok(target);
            }
        }

        Err(AggregateError::NoReleasesFound.into())
    }

    async fn try_resolve(
        &self,
        origin: TargetOrigin,
        intent: &VersionIntent,
        catalog: &mut Option<Vec<Release>>,
    ) -> Result<Option<ResolvedTarget>> {
        match origin {
            TargetOrigin::Custom => Ok(intent.custom.as_ref().map(|custom| ResolvedTarget {
                version: custom.version.clone(),
                download_url: custom.url.clone(),
                origin,
            })),
            TargetOrigin::Requested => {
                let Some(requested) = &intent.requested else {
                    return Ok(None);
                };
                let releases = self.catalog(intent, catalog).await?;
                match releases.iter().find(|release| release.is_version(requested)) {
                    Some(release) => Ok(Some(ResolvedTarget::from_release(release, origin))),
                    None => Err(AggregateError::RequestedVersionUnavailable {
                        requested: requested.to_string(),
                        available: releases.iter().map(|r| r.tag().to_string()).collect(),
                    }
                    .into()),
                }
            }
            TargetOrigin::Latest => {
                let releases = self.catalog(intent, catalog).await?;
                Ok(releases.first().map(|release| ResolvedTarget::from_release(release, origin)))
            }
        }
    }

    async fn catalog<'c>(
        &self,
        intent: &VersionIntent,
        catalog: &'c mut Option<Vec<Release>>,
    ) -> Result<&'c [Release]> {
        if catalog.is_none() {
            *catalog = Some(self.source.fetch(intent.include_pre_releases).await?);
        }
        Ok(catalog.as_deref().unwrap_or_default())
    }
}

/// Available literals close to `requested`, closest first, at most three.
pub fn similar_versions(requested: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> = available
        .iter()
        .map(|candidate| (candidate.clone(), levenshtein(requested, candidate)))
        .collect();

    scored.sort_by_key(|(_, distance)| *distance);

    scored
        .into_iter()
        .filter(|(_, distance)| *distance <= requested.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(candidate, _)| candidate)
        .collect()
}
