use semrel_git_tools::RepoError;
use semrel_semver_tools::{ClassifierError, VersionError};
use thiserror::Error;

/// Errors found while validating the release configuration at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The branch list is empty.
    #[error("no branches configured")]
    NoBranches,

    /// A branch was configured more than once.
    #[error("branch `{0}` is configured more than once")]
    DuplicateBranch(String),

    /// A prerelease branch names a base branch that is not configured.
    #[error("branch `{branch}` names unknown prerelease base `{base}`")]
    UnknownPrereleaseBase {
        /// The prerelease branch carrying the reference.
        branch: String,
        /// The base name that matched no configured branch.
        base: String,
    },

    /// A monorepo project was configured without a name.
    #[error("monorepo project with empty name")]
    UnnamedProject,
}

/// Errors surfaced while discovering version tags.
#[derive(Error, Debug)]
#[error("failed to index tags: {0}")]
pub struct TagIndexError(#[from] pub RepoError);

/// Errors surfaced while resolving branches or walking history windows.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The branch tip could not be resolved locally or on `origin`.
    #[error("unknown branch `{0}`")]
    UnknownBranch(String),

    /// The Git backend failed.
    #[error(transparent)]
    Backend(#[from] RepoError),
}

/// Errors that abort a single `(branch, project)` decision.
///
/// The engine logs these, emits the decision with an error note, and
/// continues with the remaining scopes.
#[derive(Error, Debug)]
pub enum DecisionError {
    /// The branch tip could not be resolved.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// The computed version could not be formed (for example a branch name
    /// that is not a valid prerelease identifier).
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The run was cancelled mid-window.
    #[error("release computation cancelled")]
    Cancelled,
}

/// Errors that abort an entire engine run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Startup validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The commit classifier could not be constructed.
    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    /// Tag discovery failed.
    #[error(transparent)]
    TagIndex(#[from] TagIndexError),

    /// The run was cancelled through the cancellation token.
    #[error("release computation cancelled")]
    Cancelled,
}

/// Errors surfaced while creating or pushing a tag for a decision.
#[derive(Error, Debug)]
pub enum TaggerError {
    /// The decision does not carry a responsible commit to tag.
    #[error("decision for branch `{0}` has no commit to tag")]
    NoCommit(String),

    /// The Git backend failed; this covers duplicate tags, signing failures
    /// and push rejections.
    #[error(transparent)]
    Backend(#[from] RepoError),
}
