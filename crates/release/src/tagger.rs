//! The tagger: writes release decisions back as Git tags.

use semrel_git_tools::{Repo, Signer, TagMode};
use semrel_semver_tools::Version;

use crate::engine::ReleaseDecision;
use crate::error::TaggerError;

/// Creates tags for release decisions and optionally pushes them.
///
/// The tag ref name carries the configured prefix
/// (`[project-]<prefix><version>`); the annotated tag message carries the
/// bare version. Reading back is format-agnostic: the tag index accepts both
/// annotated and lightweight tags regardless of the mode configured here.
///
/// # Examples
///
/// ```rust
/// use semrel_git_tools::{Repo, TagMode};
/// use semrel_release_tools::Tagger;
/// use semrel_semver_tools::Version;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Repo::open(".")?;
/// let tagger = Tagger::new(&repo, "v", TagMode::Annotated);
///
/// let version = Version::parse("1.2.3")?;
/// assert_eq!(tagger.format(&version, None), "v1.2.3");
/// assert_eq!(tagger.format(&version, Some("foo")), "foo-v1.2.3");
/// # Ok(())
/// # }
/// ```
pub struct Tagger<'a> {
    repo: &'a Repo,
    prefix: String,
    mode: TagMode,
    signer: Option<&'a dyn Signer>,
    remote: Option<String>,
    access_token: Option<String>,
}

impl<'a> Tagger<'a> {
    /// Creates a tagger writing tags of the given mode.
    pub fn new(repo: &'a Repo, prefix: &str, mode: TagMode) -> Self {
        Self {
            repo,
            prefix: prefix.to_string(),
            mode,
            signer: None,
            remote: None,
            access_token: None,
        }
    }

    /// Signs annotated tag payloads with the given signer.
    ///
    /// Has no effect in lightweight mode; a lightweight tag is a bare ref
    /// and carries nothing to sign.
    #[must_use]
    pub fn with_signer(mut self, signer: &'a dyn Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Pushes each created tag to the named remote.
    #[must_use]
    pub fn with_remote(mut self, remote: &str, access_token: Option<&str>) -> Self {
        self.remote = Some(remote.to_string());
        self.access_token = access_token.map(str::to_string);
        self
    }

    /// Formats the tag name for a version: `[project-]<prefix><version>`.
    pub fn format(&self, version: &Version, project: Option<&str>) -> String {
        match project {
            Some(project) => format!("{project}-{}{version}", self.prefix),
            None => format!("{}{version}", self.prefix),
        }
    }

    /// Creates the tag for a release decision, pushing it when a remote is
    /// configured. Returns the tag name.
    ///
    /// # Errors
    ///
    /// - [`TaggerError::NoCommit`] when the decision carries no responsible
    ///   commit (no-release decisions cannot be tagged).
    /// - [`TaggerError::Backend`] for duplicate tags, signing failures,
    ///   rejected pushes and other repository errors.
    pub fn apply(&self, decision: &ReleaseDecision) -> Result<String, TaggerError> {
        let Some(commit_id) = decision.commit_id.as_deref() else {
            return Err(TaggerError::NoCommit(decision.branch.clone()));
        };

        let name = self.format(&decision.next_version, decision.project.as_deref());
        let message = decision.next_version.to_string();

        self.repo.tag_commit(&name, commit_id, self.mode, &message, self.signer)?;
        log::info!("created tag {name} on {commit_id}");

        if let Some(remote) = &self.remote {
            self.repo.push_tag(remote, &name, self.access_token.as_deref())?;
            log::info!("pushed tag {name} to {remote}");
        }

        Ok(name)
    }
}
