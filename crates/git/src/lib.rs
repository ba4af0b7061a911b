//! # semrel_git_tools
//!
//! A high-level Rust interface to the Git operations the semrel release
//! engine needs, built on libgit2.
//!
//! ## Overview
//!
//! `semrel_git_tools` wraps the powerful but complex libgit2 library to offer
//! a focused interface for release automation. It is designed for
//! applications that need to:
//!
//! - Open or clone repositories (with token authentication for remotes)
//! - Resolve branch tips across local and remote-tracking refs
//! - Enumerate version tags, annotated or lightweight
//! - Walk commit history deterministically between a tag and a branch tip
//! - Compute the paths a commit changed against its first parent
//! - Create annotated, lightweight or signed tags and push them
//!
//! ## Main Features
//!
//! ### Repository access
//!
//! ```rust
//! use semrel_git_tools::Repo;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Open an existing repository
//! let repo = Repo::open("./my-project")?;
//!
//! // Clone a remote repository, optionally with an access token
//! let repo = Repo::clone("https://github.com/example/repo.git", "./cloned", None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### History windows
//!
//! ```rust
//! use semrel_git_tools::Repo;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let repo = Repo::open("./my-project")?;
//! let tip = repo.find_branch_tip("main")?.ok_or("missing branch")?;
//!
//! // Everything reachable from the tip but not from the base, oldest first.
//! let window = repo.commits_between(&tip, Some("abc123"), true)?;
//! for commit in window {
//!     println!("{} {}", commit.id, commit.message.lines().next().unwrap_or(""));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Tag management
//!
//! ```rust
//! use semrel_git_tools::{Repo, TagMode};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let repo = Repo::open("./my-project")?;
//! for tag in repo.tags()? {
//!     println!("{} -> {}", tag.ref_name, tag.commit_id);
//! }
//!
//! let tip = repo.find_branch_tip("main")?.ok_or("missing branch")?;
//! repo.tag_commit("v1.2.3", &tip, TagMode::Annotated, "1.2.3", None)?;
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

mod repo;
mod types;

pub use types::{CommitRecord, Repo, RepoError, Signer, SigningError, TagMode, TagRecord};
