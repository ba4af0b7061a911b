//! # semrel_semver_tools
//!
//! Semantic version values, release rules and conventional commit
//! classification for the semrel release engine.
//!
//! ## Overview
//!
//! This crate holds the pure, repository-independent pieces of release
//! computation:
//!
//! - [`Version`]: a semantic version value wrapping the `semver` crate, with
//!   release-aware bumping and full SemVer 2.0.0 precedence.
//! - [`ReleaseRules`]: the validated mapping from commit kinds to release
//!   levels.
//! - [`Classifier`]: the conventional-commit message parser.
//!
//! ## Main Features
//!
//! ### Version values
//!
//! ```rust
//! use semrel_semver_tools::{ReleaseLevel, Version};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let version = Version::parse("1.2.3")?;
//! assert_eq!(version.bump(ReleaseLevel::Minor).to_string(), "1.3.0");
//! # Ok(())
//! # }
//! ```
//!
//! ### Commit classification
//!
//! ```rust
//! use semrel_semver_tools::{Classifier, CommitKind};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = Classifier::new()?;
//! let commit = classifier.classify("feat(api): add pagination").unwrap();
//! assert_eq!(commit.kind, CommitKind::Feat);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::panic)]

mod conventional;
mod error;
mod rules;
mod version;


pub use conventional::{Classifier, ClassifiedCommit, CommitKind};
pub use error::{ClassifierError, RulesError, UnknownKindError, VersionError};
pub use rules::{ReleaseLevel, ReleaseRules};
pub use version::Version;
