//! Semantic version values.
//!
//! Wraps the `semver` crate's `Version` type to provide the release engine's
//! domain API: parsing with domain errors, release-level bumping, prerelease
//! channel helpers and SemVer 2.0.0 precedence comparison.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Serialize};

use crate::error::VersionError;
use crate::rules::ReleaseLevel;

/// A semantic version number.
///
/// Follows the semantic versioning 2.0.0 specification:
///
/// - `MAJOR.MINOR.PATCH` (e.g. `1.2.3`)
/// - Optional prerelease: `MAJOR.MINOR.PATCH-PRERELEASE` (e.g. `1.0.0-rc.1`)
/// - Optional build metadata: `MAJOR.MINOR.PATCH+BUILD` (e.g. `1.0.0+5d26f3`)
///
/// Build metadata never participates in precedence; use
/// [`Version::cmp_precedence`] when ordering versions.
///
/// # Examples
///
/// ```rust
/// use semrel_semver_tools::Version;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let version = Version::parse("1.2.3-rc.1")?;
/// assert_eq!(version.major(), 1);
/// assert_eq!(version.prerelease(), "rc.1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version {
    inner: semver::Version,
}

impl Version {
    /// Parses a version string into a `Version`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::MalformedVersion`] when the text has
    /// non-numeric or negative numeric components, empty identifiers, or
    /// identifiers outside `[A-Za-z0-9-]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use semrel_semver_tools::Version;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let version = Version::parse("2.0.0-beta.1+build.5")?;
    /// assert_eq!(version.to_string(), "2.0.0-beta.1+build.5");
    ///
    /// assert!(Version::parse("1.2").is_err());
    /// assert!(Version::parse("1.2.-3").is_err());
    /// assert!(Version::parse("1.0.0-beta..1").is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let inner =
            semver::Version::from_str(text).map_err(|e| VersionError::MalformedVersion {
                version: text.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { inner })
    }

    /// Creates a new version from its numeric components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { inner: semver::Version::new(major, minor, patch) }
    }

    /// The zero version `0.0.0`.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns true iff this is `0.0.0` with no prerelease and no metadata.
    pub fn is_zero(&self) -> bool {
        self.inner.major == 0
            && self.inner.minor == 0
            && self.inner.patch == 0
            && self.inner.pre.is_empty()
            && self.inner.build.is_empty()
    }

    /// Returns the major version number.
    pub fn major(&self) -> u64 {
        self.inner.major
    }

    /// Returns the minor version number.
    pub fn minor(&self) -> u64 {
        self.inner.minor
    }

    /// Returns the patch version number.
    pub fn patch(&self) -> u64 {
        self.inner.patch
    }

    /// Returns the prerelease identifiers joined by `.`, empty when absent.
    pub fn prerelease(&self) -> &str {
        self.inner.pre.as_str()
    }

    /// Returns the build metadata identifiers joined by `.`, empty when absent.
    pub fn metadata(&self) -> &str {
        self.inner.build.as_str()
    }

    /// Returns true when the version carries a prerelease component.
    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }

    /// Returns the `(major, minor, patch)` triple.
    pub fn numeric_triple(&self) -> (u64, u64, u64) {
        (self.inner.major, self.inner.minor, self.inner.patch)
    }

    /// Returns the first dot-segment of the prerelease, if any.
    ///
    /// For `1.0.0-rc.2` this is `rc`; prerelease branches use it to match
    /// their identifier against prior tags.
    pub fn prerelease_channel(&self) -> Option<&str> {
        if self.inner.pre.is_empty() {
            return None;
        }
        self.inner.pre.as_str().split('.').next()
    }

    /// Returns the numeric second dot-segment of the prerelease, if any.
    ///
    /// For `1.0.0-rc.2` this is `2`. Missing or non-numeric counters yield
    /// `None`.
    pub fn prerelease_counter(&self) -> Option<u64> {
        let pre = self.inner.pre.as_str();
        if pre.is_empty() {
            return None;
        }
        pre.split('.').nth(1).and_then(|segment| segment.parse().ok())
    }

    /// Applies a single bump of the given release level.
    ///
    /// For stable versions this is the familiar increment: a major bump
    /// zeroes minor and patch, a minor bump zeroes patch, and all bumps
    /// clear the prerelease and metadata components.
    ///
    /// A version that already carries a prerelease is treated as the not yet
    /// released form of its numeric triple: when the triple already covers
    /// the requested level (patch: always; minor: `patch == 0`; major:
    /// `minor == 0 && patch == 0`) the triple is kept and only the
    /// prerelease is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use semrel_semver_tools::{ReleaseLevel, Version};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let stable = Version::parse("1.2.3")?;
    /// assert_eq!(stable.bump(ReleaseLevel::Major).to_string(), "2.0.0");
    /// assert_eq!(stable.bump(ReleaseLevel::Minor).to_string(), "1.3.0");
    /// assert_eq!(stable.bump(ReleaseLevel::Patch).to_string(), "1.2.4");
    ///
    /// let pre = Version::parse("0.1.0-main.1")?;
    /// assert_eq!(pre.bump(ReleaseLevel::Patch).to_string(), "0.1.0");
    /// assert_eq!(pre.bump(ReleaseLevel::Minor).to_string(), "0.1.0");
    /// assert_eq!(pre.bump(ReleaseLevel::Major).to_string(), "1.0.0");
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn bump(&self, level: ReleaseLevel) -> Self {
        match level {
            ReleaseLevel::Major => self.bump_major(),
            ReleaseLevel::Minor => self.bump_minor(),
            ReleaseLevel::Patch => self.bump_patch(),
        }
    }

    /// Bumps the major component, zeroing minor and patch.
    #[must_use]
    pub fn bump_major(&self) -> Self {
        let mut inner = self.inner.clone();
        if inner.pre.is_empty() || inner.minor != 0 || inner.patch != 0 {
            inner.major += 1;
            inner.minor = 0;
            inner.patch = 0;
        }
        inner.pre = Prerelease::EMPTY;
        inner.build = BuildMetadata::EMPTY;
        Self { inner }
    }

    /// Bumps the minor component, zeroing patch.
    #[must_use]
    pub fn bump_minor(&self) -> Self {
        let mut inner = self.inner.clone();
        if inner.pre.is_empty() || inner.patch != 0 {
            inner.minor += 1;
            inner.patch = 0;
        }
        inner.pre = Prerelease::EMPTY;
        inner.build = BuildMetadata::EMPTY;
        Self { inner }
    }

    /// Bumps the patch component.
    #[must_use]
    pub fn bump_patch(&self) -> Self {
        let mut inner = self.inner.clone();
        if inner.pre.is_empty() {
            inner.patch += 1;
        }
        inner.pre = Prerelease::EMPTY;
        inner.build = BuildMetadata::EMPTY;
        Self { inner }
    }

    /// Returns a copy with the given prerelease identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::MalformedPrerelease`] when the identifiers are
    /// empty or contain characters outside `[A-Za-z0-9-]`.
    pub fn with_prerelease(&self, pre: &str) -> Result<Self, VersionError> {
        let mut inner = self.inner.clone();
        inner.pre = Prerelease::new(pre).map_err(|e| VersionError::MalformedPrerelease {
            pre: pre.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Returns a copy with the prerelease component removed.
    #[must_use]
    pub fn without_prerelease(&self) -> Self {
        let mut inner = self.inner.clone();
        inner.pre = Prerelease::EMPTY;
        Self { inner }
    }

    /// Returns a copy with the given build metadata.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::MalformedMetadata`] when the identifiers are
    /// empty or contain characters outside `[A-Za-z0-9-]`.
    pub fn with_metadata(&self, metadata: &str) -> Result<Self, VersionError> {
        let mut inner = self.inner.clone();
        inner.build = BuildMetadata::new(metadata).map_err(|e| VersionError::MalformedMetadata {
            metadata: metadata.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Compares two versions under SemVer 2.0.0 precedence.
    ///
    /// Build metadata is excluded from the comparison: `1.0.0+a` and
    /// `1.0.0+b` compare equal here even though they are distinct values.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.inner.cmp_precedence(&other.inner)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
