//! Release version codes: parsing, classification and total ordering.
//!
//! Aggregate release tags look like semantic versions but only follow a small
//! part of the semver grammar:
//!
//! ```text
//! [v]MAJOR.MINOR.PATCH[-beta.ITERATION[-EXTRA]]
//! ```
//!
//! Anything after a second hyphen (`git describe` output such as
//! `-9-gf72dfeed-dirty`) is build metadata and is ignored. The only
//! recognised pre-release qualifier is `beta` (case-insensitive).
//!
//! Tags that don't follow this grammar are still representable as
//! [`VersionKind::Legacy`] values so a single odd tag in the remote catalog
//! never aborts a whole listing. Legacy versions rank below every other
//! version and are never installable.
//!
//! # Examples
//!
//! ```rust
//! use aggregate_cli::version::{VersionCode, VersionKind};
//!
//! let beta = VersionCode::parse("v2.0.0-beta.1").unwrap();
//! let stable = VersionCode::parse("v2.0.0").unwrap();
//! assert_eq!(beta.kind(), VersionKind::PreRelease);
//! assert!(beta < stable);
//!
//! let legacy = VersionCode::legacy("v1.4.15-RC1");
//! assert!(legacy < VersionCode::parse("0.0.1").unwrap());
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static VERSION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:-([A-Za-z]+)\.(\d+)(?:-.*)?)?$").ok()
});

/// Qualifier accepted as a pre-release marker.
const PRE_RELEASE_QUALIFIER: &str = "beta";

/// Errors produced while parsing a version literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The literal doesn't follow the `[v]MAJOR.MINOR.PATCH[-beta.N]` grammar.
    #[error("Version '{literal}' can't be parsed (expected [v]MAJOR.MINOR.PATCH[-beta.N])")]
    Malformed {
        /// The rejected literal
        literal: String,
    },

    /// The literal carries a qualifier other than `beta`.
    #[error("Version qualifier '{qualifier}' in '{literal}' is not supported")]
    UnsupportedQualifier {
        /// The rejected literal
        literal: String,
        /// The qualifier token found after the first hyphen
        qualifier: String,
    },
}

/// Classification of a [`VersionCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionKind {
    /// A final release, e.g. `2.0.3`.
    Normal,
    /// A beta release carrying an iteration counter, e.g. `2.0.3-beta.1`.
    PreRelease,
    /// A tag without usable version semantics.
    Legacy,
}

/// A parsed, totally ordered release version.
///
/// Equality and hashing consider `major`, `minor`, `patch`, the kind and the
/// pre-release iteration. The original literal is kept for display and for
/// building download URLs but never takes part in comparisons.
#[derive(Debug, Clone)]
pub struct VersionCode {
    literal: String,
    major: u32,
    minor: u32,
    patch: u32,
    kind: VersionKind,
    iteration: Option<u32>,
}

impl VersionCode {
    /// Parses a version literal.
    ///
    /// Leading and trailing whitespace is ignored, which lets the same parser
    /// read the single-line state file.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] when the literal doesn't follow the
    /// supported grammar and [`ParseError::UnsupportedQualifier`] when the
    /// pre-release qualifier isn't `beta`.
    pub fn parse(literal: &str) -> Result<Self, ParseError> {
        let trimmed = literal.trim();
        let malformed = || ParseError::Malformed {
            literal: trimmed.to_string(),
        };

        let captures = VERSION_PATTERN
            .as_ref()
            .and_then(|pattern| pattern.captures(trimmed))
            .ok_or_else(malformed)?;
        let number = |index: usize| -> Result<u32, ParseError> {
            captures[index].parse::<u32>().map_err(|_| malformed())
        };

        let major = number(1)?;
        let minor = number(2)?;
        let patch = number(3)?;

        let (kind, iteration) = match captures.get(4) {
            None => (VersionKind::Normal, None),
            Some(qualifier) if qualifier.as_str().eq_ignore_ascii_case(PRE_RELEASE_QUALIFIER) => {
                (VersionKind::PreRelease, Some(number(5)?))
            }
            Some(qualifier) => {
                return Err(ParseError::UnsupportedQualifier {
                    literal: trimmed.to_string(),
                    qualifier: qualifier.as_str().to_string(),
                });
            }
        };

        Ok(Self {
            literal: trimmed.to_string(),
            major,
            minor,
            patch,
            kind,
            iteration,
        })
    }

    /// Builds a legacy version for a literal that failed to parse.
    pub fn legacy(literal: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
            major: 0,
            minor: 0,
            patch: 0,
            kind: VersionKind::Legacy,
            iteration: None,
        }
    }

    /// Parses `literal`, falling back to a legacy version when it can't be parsed.
    pub fn parse_or_legacy(literal: &str) -> Self {
        Self::parse(literal).unwrap_or_else(|e| {
            tracing::debug!("Treating '{}' as a legacy version: {}", literal, e);
            Self::legacy(literal)
        })
    }

    pub const fn major(&self) -> u32 {
        self.major
    }

    pub const fn minor(&self) -> u32 {
        self.minor
    }

    pub const fn patch(&self) -> u32 {
        self.patch
    }

    pub const fn kind(&self) -> VersionKind {
        self.kind
    }

    /// The beta iteration; present only for pre-release versions.
    pub const fn iteration(&self) -> Option<u32> {
        self.iteration
    }

    /// The literal this version was built from.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_pre_release(&self) -> bool {
        self.kind == VersionKind::PreRelease
    }

    pub fn is_legacy(&self) -> bool {
        self.kind == VersionKind::Legacy
    }

    /// Builds the GitHub download URL of the WAR package for this version.
    ///
    /// The literal is substituted twice: once as the release tag and once in
    /// the package file name.
    pub fn download_url(&self) -> String {
        crate::constants::PACKAGE_DOWNLOAD_URL_TEMPLATE.replace("{version}", &self.literal)
    }
}

impl PartialEq for VersionCode {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.kind == other.kind
            && self.iteration == other.iteration
    }
}

impl Eq for VersionCode {}

impl Hash for VersionCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.kind.hash(state);
        self.iteration.hash(state);
    }
}

impl Ord for VersionCode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_legacy(), other.is_legacy()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.is_pre_release(), other.is_pre_release()) {
                // A beta is always older than its final release
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (true, true) => self.iteration.cmp(&other.iteration),
                (false, false) => Ordering::Equal,
            })
    }
}

impl PartialOrd for VersionCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl std::str::FromStr for VersionCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
