//! History windowing: the deterministic commit sequence a decision is
//! computed from.
//!
//! A window is bounded above by a branch tip and below (exclusive) by the
//! applicable base tag's commit. The git backend guarantees oldest-first
//! order with parents before children and `(committer time, commit id)`
//! tie-breaks, so the same repository state always yields the same
//! sequence.

use semrel_git_tools::{CommitRecord, Repo};

use crate::error::HistoryError;

/// Resolves a branch name to its tip commit id.
///
/// # Errors
///
/// Returns [`HistoryError::UnknownBranch`] when neither a local branch nor
/// an `origin/` remote-tracking ref with this name exists.
pub fn resolve_tip(repo: &Repo, branch_name: &str) -> Result<String, HistoryError> {
    repo.find_branch_tip(branch_name)?
        .ok_or_else(|| HistoryError::UnknownBranch(branch_name.to_string()))
}

/// Gets the window of commits reachable from `tip` but not from
/// `base_commit`, oldest first.
///
/// With no base the entire history reachable from the tip is returned.
/// `collect_paths` asks the backend to compute first-parent changed paths
/// for each record, which monorepo attribution needs.
///
/// # Errors
///
/// Returns [`HistoryError::Backend`] when the walk fails.
pub fn window(
    repo: &Repo,
    tip: &str,
    base_commit: Option<&str>,
    collect_paths: bool,
) -> Result<Vec<CommitRecord>, HistoryError> {
    Ok(repo.commits_between(tip, base_commit, collect_paths)?)
}
