//! Monorepo project definitions and path-scope attribution.

use serde::{Deserialize, Serialize};

/// A monorepo project: a name plus the directory prefixes it owns.
///
/// A commit attributes to a project when at least one of its changed paths
/// lies under one of the project's prefixes. A project with no prefixes
/// matches the entire repository.
///
/// # Examples
///
/// ```rust
/// use semrel_release_tools::Project;
///
/// let project = Project::new("foo", &["./foo".to_string()]);
/// assert!(project.is_affected(&["foo/src/lib.rs".to_string()]));
/// assert!(!project.is_affected(&["foobar/src/lib.rs".to_string()]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project name; it prefixes the project's tags (`foo-v1.2.3`).
    pub name: String,
    paths: Vec<String>,
}

/// Normalizes a configured path prefix: forward slashes, no `./` lead-in,
/// no trailing separator.
fn normalize_prefix(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    while normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized == "." {
        normalized.clear();
    }
    normalized
}

impl Project {
    /// Creates a project from configured path prefixes.
    pub fn new(name: &str, paths: &[String]) -> Self {
        let paths = paths
            .iter()
            .map(|path| normalize_prefix(path))
            .filter(|path| !path.is_empty())
            .collect();

        Self { name: name.to_string(), paths }
    }

    /// Returns true when the project matches the entire repository.
    pub fn matches_whole_repo(&self) -> bool {
        self.paths.is_empty()
    }

    /// Returns true when a single changed path lies under this project.
    fn contains(&self, changed_path: &str) -> bool {
        let changed_path = changed_path.replace('\\', "/");
        self.paths.iter().any(|prefix| {
            changed_path.as_str() == prefix
                || changed_path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Returns true when a commit with these changed paths attributes to
    /// this project.
    ///
    /// A commit with an empty first-parent diff (a no-op merge) attributes
    /// to no project, whole-repo projects included.
    pub fn is_affected(&self, changed_paths: &[String]) -> bool {
        if changed_paths.is_empty() {
            return false;
        }
        if self.matches_whole_repo() {
            return true;
        }
        changed_paths.iter().any(|path| self.contains(path))
    }
}
