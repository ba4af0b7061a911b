//! # semrel_release_tools
//!
//! The release computation engine: given a repository, a branch
//! configuration and release rules, decide per branch (and per project in a
//! monorepo) whether new conventional commits warrant a release, compute the
//! next semantic version, and write it back as a Git tag.
//!
//! ## Overview
//!
//! The crate is organized around the flow of a single run:
//!
//! 1. [`Branch`] and [`Project`] describe what to analyze; branches are
//!    processed stable-first in a deterministic order.
//! 2. [`TagIndex`] discovers prior version tags and selects the latest per
//!    scope.
//! 3. [`history`] produces the deterministic oldest-first commit window
//!    between the latest applicable tag and the branch tip.
//! 4. [`ReleaseEngine`] folds each window through the conventional-commit
//!    classifier and the release rules into [`ReleaseDecision`] values.
//! 5. [`Tagger`] consumes decisions and creates (and optionally pushes) the
//!    resulting tags.
//!
//! ## Example
//!
//! ```rust
//! use semrel_git_tools::Repo;
//! use semrel_release_tools::{Branch, CancelToken, ReleaseEngine};
//! use semrel_semver_tools::ReleaseRules;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repo::open(".")?;
//! let branches = vec![Branch::stable("main")];
//! let rules = ReleaseRules::default();
//!
//! let engine = ReleaseEngine::new(&repo, branches, &[], &rules, "v", None, CancelToken::new())?;
//! for decision in engine.run()? {
//!     println!("{}: {} -> {}", decision.branch, decision.prior_version, decision.next_version);
//! }
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

mod branch;
mod cancel;
mod engine;
mod error;
pub mod history;
mod project;
mod tagger;
mod tags;


pub use branch::{sort_branches, validate_branches, Branch};
pub use cancel::CancelToken;
pub use engine::{ReleaseDecision, ReleaseEngine};
pub use error::{ConfigError, DecisionError, EngineError, HistoryError, TagIndexError, TaggerError};
pub use project::Project;
pub use tagger::Tagger;
pub use tags::{TagIndex, VersionTag};
