use chrono::{DateTime, Utc};
use git2::{Error as Git2Error, Repository};
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;

/// Represents a Git repository with high-level operation methods
///
/// This struct wraps the libgit2 `Repository` type and provides the
/// operations the release engine needs: branch tip resolution, tag
/// enumeration, deterministic history windows, first-parent diffs, and tag
/// creation.
///
/// # Examples
///
/// ```
/// use semrel_git_tools::Repo;
///
/// let repo = Repo::open("./my-repo").expect("Failed to open repository");
///
/// let tags = repo.tags().expect("Failed to list tags");
/// for tag in tags {
///     println!("{} points at {}", tag.ref_name, tag.commit_id);
/// }
/// ```
#[derive(Clone)]
pub struct Repo {
    #[allow(clippy::arc_with_non_send_sync)]
    pub(crate) repo: Arc<Repository>,
    pub(crate) local_path: PathBuf,
}

/// Represents a commit observed while walking a history window
///
/// Records carry everything the release engine consumes: identity, commit
/// time, parentage, the full message and (when requested) the set of paths
/// that differ from the first parent.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    /// The commit hash (SHA)
    pub id: String,
    /// The committer timestamp
    pub when: DateTime<Utc>,
    /// Hashes of the commit parents, first parent first
    pub parent_ids: Vec<String>,
    /// The full commit message
    pub message: String,
    /// Destination paths differing from the first parent (or from the empty
    /// tree for a root commit). Empty unless path collection was requested.
    pub changed_paths: Vec<String>,
}

/// Represents a tag reference in the repository
///
/// Both annotated and lightweight tags are reduced to this shape: the short
/// ref name, the commit the tag ultimately points at, and the tagger
/// timestamp when the tag object carries one.
#[derive(Debug, Clone)]
pub struct TagRecord {
    /// The short tag name (e.g. `v1.0.0`), without the `refs/tags/` prefix
    pub ref_name: String,
    /// The hash of the commit the tag points to, after peeling annotated tags
    pub commit_id: String,
    /// The tagger timestamp for annotated tags, `None` for lightweight ones
    pub tagged_at: Option<i64>,
}

/// The kind of tag object the repository writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    /// A full tag object carrying tagger, message and optional signature
    Annotated,
    /// A bare ref pointing directly at the commit
    Lightweight,
}

/// Signs raw tag payloads.
///
/// The release tooling treats key material as an external concern: whatever
/// loads an OpenPGP key only has to produce an implementation of this trait.
/// The signature is expected to be ASCII-armored and detached; it is embedded
/// verbatim into the tag object.
pub trait Signer {
    /// Produces an armored detached signature over `payload`.
    fn sign(&self, payload: &[u8]) -> Result<String, SigningError>;
}

/// Error produced by a [`Signer`] implementation.
#[derive(Error, Debug)]
#[error("signing failed: {0}")]
pub struct SigningError(pub String);

/// Errors that can occur when working with Git repositories
///
/// Each variant provides context about what operation failed and includes
/// the underlying libgit2 error where one exists.
#[derive(Error, Debug)]
pub enum RepoError {
    /// Failed to canonicalize a path
    #[error("Failed to canonicalize path: {0}")]
    CanonicalPathFailure(#[source] std::io::Error),

    /// Generic Git operation failure
    #[error("Failed to execute git: {0}")]
    GitFailure(#[source] Git2Error),

    /// Failed to open an existing repository
    #[error("Failed to open repository: {0}")]
    OpenRepoFailure(#[source] Git2Error),

    /// Failed to clone a repository
    #[error("Failed to clone repository: {0}")]
    CloneRepoFailure(#[source] Git2Error),

    /// Git configuration error
    #[error("Git configuration error: {0}")]
    ConfigError(#[source] Git2Error),

    /// Failed to peel a reference to a commit
    #[error("Failed to peel to commit: {0}")]
    PeelError(#[source] Git2Error),

    /// Failed to look up a branch
    #[error("Failed to look up branch: {0}")]
    BranchError(#[source] Git2Error),

    /// Failed to build a signature for tagging
    #[error("Failed to get repository signature: {0}")]
    SignatureError(#[source] Git2Error),

    /// Failed on reference lookup or parsing
    #[error("Failed on reference: {0}")]
    ReferenceError(#[source] Git2Error),

    /// Failed to parse a commit SHA
    #[error("Failed to parse commit sha: {0}")]
    CommitOidError(#[source] Git2Error),

    /// Failed to read a commit object
    #[error("Failed to read commit: {0}")]
    CommitError(#[source] Git2Error),

    /// Failed on diff operations
    #[error("Failed on diff: {0}")]
    DiffError(#[source] Git2Error),

    /// Failed on revision walking
    #[error("Failed on revwalk: {0}")]
    RevWalkError(#[source] Git2Error),

    /// Failed on tag enumeration
    #[error("Failed on tag: {0}")]
    TagError(#[source] Git2Error),

    /// Failed to create a tag
    #[error("Failed to create tag: {0}")]
    CreateTagError(#[source] Git2Error),

    /// A tag ref with this name already exists
    #[error("Tag `{name}` already exists")]
    TagAlreadyExists {
        /// The short name of the conflicting tag
        name: String,
    },

    /// Failed to write an object to the object database
    #[error("Failed to write object: {0}")]
    OdbError(#[source] Git2Error),

    /// Signing the tag payload failed
    #[error(transparent)]
    SigningFailed(#[from] SigningError),

    /// Failed on remote operations
    #[error("Failed on remote: {0}")]
    RemoteError(#[source] Git2Error),

    /// Failed to push to a remote
    #[error("Failed to push to remote: {0}")]
    PushError(#[source] Git2Error),

    /// The remote rejected the pushed ref
    #[error("Push of `{reference}` rejected by remote: {reason}")]
    PushRejected {
        /// The refspec that was rejected
        reference: String,
        /// The server-side message
        reason: String,
    },
}

impl From<Git2Error> for RepoError {
    fn from(err: Git2Error) -> Self {
        RepoError::GitFailure(err)
    }
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("local_path", &self.local_path)
            // Skip the repo field as Repository doesn't implement Debug
            .finish_non_exhaustive()
    }
}
