//! Conventional commit classification.
//!
//! Maps a full commit message to the `{kind, scope, breaking, subject}`
//! record the release engine consumes. Subjects that do not follow the
//! `<type>(scope)?!?: <subject>` convention classify as nothing and are
//! ignored upstream.

use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, UnknownKindError};

/// The recognized conventional commit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
    /// Build system changes
    Build,
    /// Maintenance tasks
    Chore,
    /// CI/CD changes
    Ci,
    /// Documentation changes
    Docs,
    /// New feature
    Feat,
    /// Bug fix
    Fix,
    /// Performance improvements
    Perf,
    /// Code refactoring
    Refactor,
    /// Revert of a previous commit
    Revert,
    /// Code style changes (formatting, etc.)
    Style,
    /// Test changes
    Test,
}

impl CommitKind {
    /// Gets the string representation of the commit kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Chore => "chore",
            Self::Ci => "ci",
            Self::Docs => "docs",
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Perf => "perf",
            Self::Refactor => "refactor",
            Self::Revert => "revert",
            Self::Style => "style",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for CommitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommitKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Self::Build),
            "chore" => Ok(Self::Chore),
            "ci" => Ok(Self::Ci),
            "docs" => Ok(Self::Docs),
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "perf" => Ok(Self::Perf),
            "refactor" => Ok(Self::Refactor),
            "revert" => Ok(Self::Revert),
            "style" => Ok(Self::Style),
            "test" => Ok(Self::Test),
            other => Err(UnknownKindError(other.to_string())),
        }
    }
}

/// A commit message reduced to its release-relevant parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCommit {
    /// Kind of commit (feat, fix, etc.)
    pub kind: CommitKind,
    /// Optional scope of the change. Captured for downstream consumers, the
    /// engine itself does not use it.
    pub scope: Option<String>,
    /// Whether this is a breaking change
    pub breaking: bool,
    /// Subject text after the `type(scope): ` header
    pub subject: String,
}

/// Parser for conventional commit messages.
///
/// # Examples
///
/// ```rust
/// use semrel_semver_tools::{Classifier, CommitKind};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let classifier = Classifier::new()?;
///
/// let commit = classifier.classify("fix(parser)!: reject empty scopes").unwrap();
/// assert_eq!(commit.kind, CommitKind::Fix);
/// assert_eq!(commit.scope.as_deref(), Some("parser"));
/// assert!(commit.breaking);
///
/// assert!(classifier.classify("updated some things").is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Regex for the conventional subject line
    subject_regex: Regex,
    /// Regex for detecting breaking changes in the body
    breaking_regex: Regex,
}

impl Classifier {
    /// Creates a new classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidPattern`] if regex compilation
    /// fails.
    pub fn new() -> Result<Self, ClassifierError> {
        let subject_regex = Regex::new(
            r"^(?P<type>[a-z]+)(?:\((?P<scope>[^()]*)\))?(?P<breaking>!)?:\s+(?P<subject>.+)$",
        )
        .map_err(ClassifierError::InvalidPattern)?;

        let breaking_regex =
            Regex::new(r"BREAKING[ -]CHANGE").map_err(ClassifierError::InvalidPattern)?;

        Ok(Self { subject_regex, breaking_regex })
    }

    /// Classifies a full, possibly multi-line commit message.
    ///
    /// Returns `None` when the subject line does not follow the convention
    /// or uses a kind outside the recognized set; such commits carry no
    /// release effect.
    pub fn classify(&self, message: &str) -> Option<ClassifiedCommit> {
        let mut lines = message.lines();
        let first_line = lines.next()?;

        let captures = self.subject_regex.captures(first_line)?;

        let kind = CommitKind::from_str(captures.name("type")?.as_str()).ok()?;
        let scope = captures.name("scope").map(|m| m.as_str().to_string());
        let subject = captures.name("subject")?.as_str().to_string();

        let breaking = captures.name("breaking").is_some()
            || lines.any(|line| self.breaking_regex.is_match(line));

        Some(ClassifiedCommit { kind, scope, breaking, subject })
    }
}
