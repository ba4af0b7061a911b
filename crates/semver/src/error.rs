use thiserror::Error;

/// Errors produced when parsing or transforming semantic versions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The version text does not follow `MAJOR.MINOR.PATCH[-PRE][+META]`.
    #[error("malformed version `{version}`: {reason}")]
    MalformedVersion {
        /// The offending version text.
        version: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A prerelease identifier list failed validation.
    #[error("malformed prerelease `{pre}`: {reason}")]
    MalformedPrerelease {
        /// The offending prerelease text.
        pre: String,
        /// Why validation failed.
        reason: String,
    },

    /// A build metadata identifier list failed validation.
    #[error("malformed build metadata `{metadata}`: {reason}")]
    MalformedMetadata {
        /// The offending metadata text.
        metadata: String,
        /// Why validation failed.
        reason: String,
    },
}

/// Errors produced when validating a release rule mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// A commit kind outside the conventional set was configured.
    #[error("unknown commit kind `{0}` in release rules")]
    UnknownKind(String),

    /// A release level other than `minor` or `patch` was configured.
    #[error("unknown release level `{0}`: only `minor` and `patch` are configurable")]
    UnknownLevel(String),

    /// The same commit kind was mapped more than once.
    #[error("commit kind `{0}` is mapped to more than one release level")]
    DuplicateRule(String),
}

/// Error returned when text does not name a conventional commit kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized commit kind `{0}`")]
pub struct UnknownKindError(pub String);

/// Errors produced when constructing the commit classifier.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// One of the classifier patterns failed to compile.
    #[error("failed to compile classifier pattern: {0}")]
    InvalidPattern(#[source] regex::Error),
}
