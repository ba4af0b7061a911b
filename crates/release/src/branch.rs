//! Branch configuration and deterministic ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A branch the engine analyzes.
///
/// Stable branches release plain versions; prerelease branches release
/// versions carrying the branch name as their prerelease identifier
/// (`1.2.0-rc.1` on a branch named `rc`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// The short branch name (e.g. `main`)
    pub name: String,
    /// Whether decisions on this branch carry a prerelease identifier
    #[serde(default)]
    pub prerelease: bool,
    /// Optional name of the stable branch this prerelease branch is cut
    /// from. Validated at startup; the engine itself keys prerelease
    /// matching on the branch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease_base: Option<String>,
}

impl Branch {
    /// Creates a stable branch entry.
    pub fn stable(name: &str) -> Self {
        Self { name: name.to_string(), prerelease: false, prerelease_base: None }
    }

    /// Creates a prerelease branch entry.
    pub fn prerelease(name: &str) -> Self {
        Self { name: name.to_string(), prerelease: true, prerelease_base: None }
    }
}

/// Sorts branches into the engine's processing order.
///
/// Stable branches come first, keeping their configuration order; prerelease
/// branches follow, ordered lexicographically descending by name. The sort
/// is stable, so the result is deterministic for a fixed configuration and
/// emitted decisions do not depend on how the caller ordered the list.
pub fn sort_branches(branches: &mut [Branch]) {
    branches.sort_by(|a, b| match (a.prerelease, b.prerelease) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => b.name.cmp(&a.name),
    });
}

/// Validates a branch configuration at startup.
///
/// # Errors
///
/// - [`ConfigError::NoBranches`] for an empty list.
/// - [`ConfigError::DuplicateBranch`] when a name repeats.
/// - [`ConfigError::UnknownPrereleaseBase`] when `prerelease_base` names a
///   branch that is not configured.
pub fn validate_branches(branches: &[Branch]) -> Result<(), ConfigError> {
    if branches.is_empty() {
        return Err(ConfigError::NoBranches);
    }

    let mut seen = HashSet::new();
    for branch in branches {
        if !seen.insert(branch.name.as_str()) {
            return Err(ConfigError::DuplicateBranch(branch.name.clone()));
        }
    }

    for branch in branches {
        if let Some(base) = &branch.prerelease_base {
            if !branches.iter().any(|candidate| &candidate.name == base) {
                return Err(ConfigError::UnknownPrereleaseBase {
                    branch: branch.name.clone(),
                    base: base.clone(),
                });
            }
        }
    }

    Ok(())
}
