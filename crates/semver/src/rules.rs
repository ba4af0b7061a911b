//! Release rules: the validated mapping from commit kinds to release levels.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conventional::CommitKind;
use crate::error::RulesError;

/// The release level a window of commits resolves to.
///
/// Levels are ordered `Patch < Minor < Major` so the engine can fold a
/// window of classified commits into its highest level with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseLevel {
    /// Increment the patch component.
    Patch,
    /// Increment the minor component.
    Minor,
    /// Increment the major component. Reserved for breaking changes and not
    /// configurable through release rules.
    Major,
}

impl ReleaseLevel {
    /// Gets the string representation of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl std::fmt::Display for ReleaseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mapping from commit kind to the release level it triggers.
///
/// Kinds without an entry do not trigger a release. Breaking changes bypass
/// the rules entirely and always resolve to [`ReleaseLevel::Major`].
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use semrel_semver_tools::{CommitKind, ReleaseLevel, ReleaseRules};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rules = ReleaseRules::default();
/// assert_eq!(rules.level_for(CommitKind::Feat), Some(ReleaseLevel::Minor));
/// assert_eq!(rules.level_for(CommitKind::Docs), None);
///
/// let mut mapping = HashMap::new();
/// mapping.insert("minor".to_string(), vec!["feat".to_string(), "fix".to_string()]);
/// let rules = ReleaseRules::from_map(&mapping)?;
/// assert_eq!(rules.level_for(CommitKind::Fix), Some(ReleaseLevel::Minor));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReleaseRules {
    levels: HashMap<CommitKind, ReleaseLevel>,
}

impl ReleaseRules {
    /// Builds release rules from a `level -> kinds` mapping.
    ///
    /// This is the shape the configuration surface uses: the keys are level
    /// names (`minor`, `patch`), the values list commit kinds.
    ///
    /// # Errors
    ///
    /// - [`RulesError::UnknownLevel`] for a key other than `minor`/`patch`
    ///   (`major` is reserved for breaking changes).
    /// - [`RulesError::UnknownKind`] for a kind outside the conventional set.
    /// - [`RulesError::DuplicateRule`] when a kind is listed more than once.
    pub fn from_map(mapping: &HashMap<String, Vec<String>>) -> Result<Self, RulesError> {
        let mut levels = HashMap::new();

        // Iterate level names sorted so validation errors are stable.
        let mut level_names: Vec<&String> = mapping.keys().collect();
        level_names.sort();

        for level_name in level_names {
            let level = match level_name.as_str() {
                "minor" => ReleaseLevel::Minor,
                "patch" => ReleaseLevel::Patch,
                other => return Err(RulesError::UnknownLevel(other.to_string())),
            };

            for kind_name in &mapping[level_name] {
                let kind = CommitKind::from_str(kind_name)
                    .map_err(|e| RulesError::UnknownKind(e.0))?;

                if levels.insert(kind, level).is_some() {
                    return Err(RulesError::DuplicateRule(kind_name.clone()));
                }
            }
        }

        Ok(Self { levels })
    }

    /// Gets the release level a commit kind triggers, if any.
    pub fn level_for(&self, kind: CommitKind) -> Option<ReleaseLevel> {
        self.levels.get(&kind).copied()
    }
}

impl Default for ReleaseRules {
    /// The default rules: `feat` releases a minor, `fix`, `perf` and
    /// `revert` release a patch.
    fn default() -> Self {
        let mut levels = HashMap::new();
        levels.insert(CommitKind::Feat, ReleaseLevel::Minor);
        levels.insert(CommitKind::Fix, ReleaseLevel::Patch);
        levels.insert(CommitKind::Perf, ReleaseLevel::Patch);
        levels.insert(CommitKind::Revert, ReleaseLevel::Patch);
        Self { levels }
    }
}
