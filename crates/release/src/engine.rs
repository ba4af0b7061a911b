//! The release engine: the per-(branch, project) decision state machine.
//!
//! For each configured branch in deterministic order, and for each project
//! (or the whole repository when no monorepo is configured), the engine
//! finds the latest applicable tag, walks the commit window above it, folds
//! the classified commits into the highest release level seen, and emits one
//! [`ReleaseDecision`].

use semrel_git_tools::Repo;
use semrel_semver_tools::{Classifier, ReleaseLevel, ReleaseRules, Version};
use serde::Serialize;

use crate::branch::{sort_branches, validate_branches, Branch};
use crate::cancel::CancelToken;
use crate::error::{ConfigError, DecisionError, EngineError};
use crate::history;
use crate::project::Project;
use crate::tags::TagIndex;

/// The outcome of analyzing one `(branch, project)` scope.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseDecision {
    /// The branch the decision belongs to
    pub branch: String,
    /// The project scope, `None` outside monorepo mode
    pub project: Option<String>,
    /// The version of the applicable base tag, `0.0.0` when none was found
    pub prior_version: Version,
    /// The computed next version; equals `prior_version` when no release is
    /// warranted
    pub next_version: Version,
    /// Whether the window contained release-worthy commits
    pub new_release: bool,
    /// The responsible commit: the last bumping commit of the window. Set
    /// iff `new_release` is true; it is where the tagger points the new tag.
    pub commit_id: Option<String>,
    /// Error annotation for decisions that could not be fully computed
    pub note: Option<String>,
}

impl ReleaseDecision {
    fn no_release(branch: &str, project: Option<&str>, version: Version) -> Self {
        Self {
            branch: branch.to_string(),
            project: project.map(str::to_string),
            prior_version: version.clone(),
            next_version: version,
            new_release: false,
            commit_id: None,
            note: None,
        }
    }

    fn annotated(branch: &str, project: Option<&str>, note: String) -> Self {
        Self { note: Some(note), ..Self::no_release(branch, project, Version::zero()) }
    }
}

/// The release computation engine.
///
/// Owns nothing but the per-run cursor state; configuration is borrowed
/// read-only from the caller and the repository handle stays open for the
/// lifetime of the engine.
///
/// # Examples
///
/// ```rust
/// use semrel_git_tools::Repo;
/// use semrel_release_tools::{Branch, CancelToken, ReleaseEngine};
/// use semrel_semver_tools::ReleaseRules;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Repo::open(".")?;
/// let branches = vec![Branch::stable("main"), Branch::prerelease("rc")];
/// let rules = ReleaseRules::default();
///
/// let engine = ReleaseEngine::new(&repo, branches, &[], &rules, "v", None, CancelToken::new())?;
/// let decisions = engine.run()?;
/// # Ok(())
/// # }
/// ```
pub struct ReleaseEngine<'a> {
    repo: &'a Repo,
    branches: Vec<Branch>,
    projects: &'a [Project],
    rules: &'a ReleaseRules,
    tag_prefix: &'a str,
    build_metadata: Option<&'a str>,
    classifier: Classifier,
    cancel: CancelToken,
}

impl<'a> ReleaseEngine<'a> {
    /// Creates an engine over a validated configuration.
    ///
    /// Branches are sorted into processing order here; the caller's list
    /// order only matters among stable branches.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when the branch list is empty, a
    /// branch repeats, a `prerelease_base` names an unconfigured branch, or
    /// a project has no name; [`EngineError::Classifier`] when the commit
    /// classifier cannot be built.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: &'a Repo,
        mut branches: Vec<Branch>,
        projects: &'a [Project],
        rules: &'a ReleaseRules,
        tag_prefix: &'a str,
        build_metadata: Option<&'a str>,
        cancel: CancelToken,
    ) -> Result<Self, EngineError> {
        validate_branches(&branches)?;
        if projects.iter().any(|project| project.name.is_empty()) {
            return Err(ConfigError::UnnamedProject.into());
        }

        sort_branches(&mut branches);
        let classifier = Classifier::new()?;

        Ok(Self { repo, branches, projects, rules, tag_prefix, build_metadata, classifier, cancel })
    }

    /// Runs the engine over every `(branch, project)` scope.
    ///
    /// Decisions come back in branch processing order, projects in
    /// configuration order within each branch. Recoverable per-decision
    /// failures (an absent branch, an unreadable window) produce a
    /// no-release decision carrying a note; only cancellation and fatal
    /// setup errors abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TagIndex`] when tag discovery fails and
    /// [`EngineError::Cancelled`] when the cancellation token fires.
    pub fn run(&self) -> Result<Vec<ReleaseDecision>, EngineError> {
        let index = TagIndex::scan(self.repo, self.tag_prefix, self.projects)?;
        let mut decisions = Vec::new();

        for branch in &self.branches {
            if self.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            // Resolve the tip once per branch; an absent branch yields a
            // marker decision instead of sinking the run.
            let tip = match history::resolve_tip(self.repo, &branch.name) {
                Ok(tip) => tip,
                Err(e) => {
                    log::warn!("skipping branch {}: {e}", branch.name);
                    decisions.push(ReleaseDecision::annotated(&branch.name, None, e.to_string()));
                    continue;
                }
            };

            let scopes: Vec<Option<&Project>> = if self.projects.is_empty() {
                vec![None]
            } else {
                self.projects.iter().map(Some).collect()
            };

            for project in scopes {
                let scope = project.map(|p| p.name.as_str());
                match self.decide(branch, &tip, project, &index) {
                    Ok(decision) => decisions.push(decision),
                    Err(DecisionError::Cancelled) => return Err(EngineError::Cancelled),
                    Err(e) => {
                        log::error!(
                            "decision failed for branch {} (project {}): {e}",
                            branch.name,
                            scope.unwrap_or("-")
                        );
                        decisions.push(ReleaseDecision::annotated(
                            &branch.name,
                            scope,
                            e.to_string(),
                        ));
                    }
                }
            }
        }

        Ok(decisions)
    }

    /// Computes the decision for one `(branch, project)` scope.
    fn decide(
        &self,
        branch: &Branch,
        tip: &str,
        project: Option<&Project>,
        index: &TagIndex,
    ) -> Result<ReleaseDecision, DecisionError> {
        let scope = project.map(|p| p.name.as_str());

        // The applicable base: stable branches only ever measure against
        // stable tags; prerelease branches take the later of the latest
        // stable tag and the latest tag of their own channel.
        let base = if branch.prerelease {
            TagIndex::later_of(
                index.latest_stable(scope),
                index.latest_prerelease(scope, &branch.name),
            )
        } else {
            index.latest_stable(scope)
        };

        let cursor = base.map_or_else(Version::zero, |tag| tag.version.clone());
        let window = history::window(
            self.repo,
            tip,
            base.map(|tag| tag.commit_id.as_str()),
            project.is_some(),
        )?;

        let mut highest: Option<ReleaseLevel> = None;
        let mut responsible: Option<String> = None;

        for commit in &window {
            if self.cancel.is_cancelled() {
                return Err(DecisionError::Cancelled);
            }

            let Some(classified) = self.classifier.classify(&commit.message) else {
                continue;
            };

            if let Some(project) = project {
                if !project.is_affected(&commit.changed_paths) {
                    continue;
                }
            }

            let level = if classified.breaking {
                ReleaseLevel::Major
            } else {
                let Some(level) = self.rules.level_for(classified.kind) else {
                    continue;
                };
                level
            };

            log::debug!(
                "commit {} ({}) releases {level} on {}",
                &commit.id[..commit.id.len().min(8)],
                classified.kind,
                branch.name
            );

            // The responsible commit ends as the last bumping commit.
            responsible = Some(commit.id.clone());
            highest = Some(highest.map_or(level, |seen| seen.max(level)));
        }

        let Some(level) = highest else {
            return Ok(ReleaseDecision::no_release(&branch.name, scope, cursor));
        };

        // A release is one version transition regardless of how many
        // commits matched: apply a single bump of the highest level seen.
        let mut next = cursor.bump(level);

        if branch.prerelease {
            // When the base already sits on this channel at the same
            // resulting triple, the counter advances; otherwise the channel
            // restarts at 1.
            let same_channel = base
                .filter(|tag| tag.version.prerelease_channel() == Some(branch.name.as_str()));
            let counter = match same_channel {
                Some(tag) if tag.version.numeric_triple() == next.numeric_triple() => {
                    tag.version.prerelease_counter().unwrap_or(0) + 1
                }
                _ => 1,
            };
            next = next.with_prerelease(&format!("{}.{counter}", branch.name))?;
        }

        if let Some(metadata) = self.build_metadata {
            next = next.with_metadata(metadata)?;
        }

        Ok(ReleaseDecision {
            branch: branch.name.clone(),
            project: scope.map(str::to_string),
            prior_version: cursor,
            next_version: next,
            new_release: true,
            commit_id: responsible,
            note: None,
        })
    }
}
