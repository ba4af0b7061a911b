//! Version tag discovery and latest-per-scope selection.

use std::cmp::Ordering;

use semrel_git_tools::Repo;
use semrel_semver_tools::Version;

use crate::error::TagIndexError;
use crate::project::Project;

/// A tag whose name parsed as a semantic version, scoped to a project when
/// the name carries a project prefix.
#[derive(Debug, Clone)]
pub struct VersionTag {
    /// The short tag ref name as found in the repository
    pub ref_name: String,
    /// The commit the tag points at (annotated tags peeled)
    pub commit_id: String,
    /// The parsed version
    pub version: Version,
    /// The project scope, `None` for whole-repo tags
    pub project: Option<String>,
    /// Tagger timestamp for annotated tags; used only as a tie-break
    tagged_at: Option<i64>,
}

/// The set of parsable version tags in a repository.
///
/// Tag names follow the grammar `(project "-")? prefix? version`. Project
/// prefixes are matched against configured project names, longest name
/// first, so `foo-bar-1.0.0` with projects `foo` and `foo-bar` scopes to
/// `foo-bar`. Names that parse as no version are skipped silently.
///
/// # Examples
///
/// ```rust
/// use semrel_git_tools::Repo;
/// use semrel_release_tools::TagIndex;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Repo::open(".")?;
/// let index = TagIndex::scan(&repo, "v", &[])?;
///
/// if let Some(latest) = index.latest_stable(None) {
///     println!("latest release: {}", latest.version);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TagIndex {
    tags: Vec<VersionTag>,
}

/// Ranks two tags: precedence first, then tag creation time, then ref name.
///
/// The time and name legs are only observable when two tags parse to equal
/// precedence (metadata-only differences); they exist so malformed
/// repositories still produce reproducible selections.
fn rank(a: &VersionTag, b: &VersionTag) -> Ordering {
    a.version
        .cmp_precedence(&b.version)
        .then_with(|| a.tagged_at.cmp(&b.tagged_at))
        .then_with(|| a.ref_name.cmp(&b.ref_name))
}

impl TagIndex {
    /// Scans the repository for version tags.
    ///
    /// Annotated and lightweight tags are both accepted regardless of what
    /// the tagger is configured to write.
    ///
    /// # Errors
    ///
    /// Returns [`TagIndexError`] when tag enumeration fails; individual
    /// unparsable tags are skipped, not errors.
    pub fn scan(repo: &Repo, prefix: &str, projects: &[Project]) -> Result<Self, TagIndexError> {
        // Longest-first so a project name that prefixes another cannot
        // shadow it.
        let mut names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        let mut tags = Vec::new();
        for record in repo.tags()? {
            match parse_tag_name(&record.ref_name, prefix, &names) {
                Some((project, version)) => tags.push(VersionTag {
                    ref_name: record.ref_name,
                    commit_id: record.commit_id,
                    version,
                    project,
                    tagged_at: record.tagged_at,
                }),
                None => {
                    log::debug!("ignoring non-version tag {}", record.ref_name);
                }
            }
        }

        Ok(Self { tags })
    }

    /// Gets the latest stable tag within a scope, prereleases excluded.
    pub fn latest_stable(&self, scope: Option<&str>) -> Option<&VersionTag> {
        self.tags
            .iter()
            .filter(|tag| tag.project.as_deref() == scope)
            .filter(|tag| !tag.version.is_prerelease())
            .max_by(|a, b| rank(a, b))
    }

    /// Gets the latest prerelease tag within a scope whose prerelease
    /// channel (first dot-segment) equals `channel`.
    pub fn latest_prerelease(&self, scope: Option<&str>, channel: &str) -> Option<&VersionTag> {
        self.tags
            .iter()
            .filter(|tag| tag.project.as_deref() == scope)
            .filter(|tag| tag.version.prerelease_channel() == Some(channel))
            .max_by(|a, b| rank(a, b))
    }

    /// Picks the later of two candidate base tags under precedence.
    pub fn later_of<'a>(
        a: Option<&'a VersionTag>,
        b: Option<&'a VersionTag>,
    ) -> Option<&'a VersionTag> {
        match (a, b) {
            (Some(a), Some(b)) => {
                if rank(a, b) == Ordering::Less {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }
}

/// Parses a tag name against the `(project "-")? prefix? version` grammar.
///
/// `names` must be sorted longest first. Returns the matched scope and
/// version, or `None` when nothing parses.
fn parse_tag_name(
    name: &str,
    prefix: &str,
    names: &[&str],
) -> Option<(Option<String>, Version)> {
    for project in names {
        if let Some(rest) = name.strip_prefix(project).and_then(|r| r.strip_prefix('-')) {
            if let Some(version) = parse_version_part(rest, prefix) {
                return Some((Some((*project).to_string()), version));
            }
        }
    }

    parse_version_part(name, prefix).map(|version| (None, version))
}

/// Parses the `prefix? version` tail of a tag name.
fn parse_version_part(text: &str, prefix: &str) -> Option<Version> {
    let bare = text.strip_prefix(prefix).unwrap_or(text);
    Version::parse(bare).ok()
}
