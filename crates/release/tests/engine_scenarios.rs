//! End-to-end engine scenarios against real temporary repositories.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
use semrel_git_tools::{Repo, TagMode};
use semrel_release_tools::{
    Branch, CancelToken, EngineError, Project, ReleaseDecision, ReleaseEngine, Tagger,
};
use semrel_semver_tools::ReleaseRules;
use tempfile::TempDir;

/// A scratch repository with a deterministic commit clock.
struct Fixture {
    dir: TempDir,
    repo: Repository,
    clock: i64,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();

        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Release Bot").unwrap();
        config.set_str("user.email", "bot@example.com").unwrap();

        Self { dir, repo, clock: 1_700_000_000 }
    }

    fn signature(&mut self) -> Signature<'static> {
        // Each commit gets a strictly later timestamp so ordering assertions
        // are meaningful.
        self.clock += 60;
        Signature::new("Release Bot", "bot@example.com", &Time::new(self.clock, 0)).unwrap()
    }

    /// Commits a change to `path` with the given message.
    fn commit(&mut self, message: &str, path: &str) -> Oid {
        let file = self.dir.path().join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, format!("{message}\n{}\n", self.clock)).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let sig = self.signature();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let parent = self.repo.head().ok().map(|head| head.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap()
    }

    fn checkout(&self, name: &str) {
        self.repo.set_head(&format!("refs/heads/{name}")).unwrap();
        let mut builder = git2::build::CheckoutBuilder::new();
        builder.force();
        self.repo.checkout_head(Some(&mut builder)).unwrap();
    }

    /// Creates a branch at the current HEAD and checks it out.
    fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
        self.checkout(name);
    }

    /// Merges `source` into `target` with a two-parent merge commit.
    fn merge_into(&mut self, target: &str, source: &str) -> Oid {
        self.checkout(target);
        let sig = self.signature();
        let ours = self.repo.head().unwrap().peel_to_commit().unwrap();
        let theirs = self
            .repo
            .find_branch(source, git2::BranchType::Local)
            .unwrap()
            .get()
            .peel_to_commit()
            .unwrap();
        let tree = theirs.tree().unwrap();

        let oid = self
            .repo
            .commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("Merge branch '{source}' into {target}"),
                &tree,
                &[&ours, &theirs],
            )
            .unwrap();
        self.checkout(target);
        oid
    }

    /// Creates a lightweight tag, the way a prior release would have left
    /// one behind.
    fn lightweight_tag(&self, name: &str, target: Oid) {
        self.repo.reference(&format!("refs/tags/{name}"), target, false, "tag").unwrap();
    }

    fn open(&self) -> Repo {
        Repo::open(self.dir.path().to_str().unwrap()).unwrap()
    }
}

fn run_engine(
    repo: &Repo,
    branches: Vec<Branch>,
    projects: &[Project],
    rules: &ReleaseRules,
) -> Vec<ReleaseDecision> {
    ReleaseEngine::new(repo, branches, projects, rules, "v", None, CancelToken::new())
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn test_breaking_window_coalesces_to_one_major() {
    let mut fixture = Fixture::new();
    fixture.commit("fix: patch the parser", "src/parser.rs");
    fixture.commit("feat!: drop the v1 wire format", "src/wire.rs");
    fixture.commit("feat: add retries", "src/retry.rs");
    fixture.commit("fix: off by one in retries", "src/retry.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);

    assert_eq!(decisions.len(), 1);
    let decision = &decisions[0];
    assert_eq!(decision.branch, "main");
    assert!(decision.new_release);
    assert_eq!(decision.prior_version.to_string(), "0.0.0");
    assert_eq!(decision.next_version.to_string(), "1.0.0");

    // The responsible commit is the last bumping one.
    let head = fixture.repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(decision.commit_id.as_deref(), Some(head.id().to_string().as_str()));

    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);
    assert_eq!(tagger.apply(decision).unwrap(), "v1.0.0");
    assert!(fixture.repo.find_reference("refs/tags/v1.0.0").is_ok());
}

#[test]
fn test_feature_window_releases_minor() {
    let mut fixture = Fixture::new();
    fixture.commit("fix: patch the parser", "src/parser.rs");
    fixture.commit("feat: add retries", "src/retry.rs");
    fixture.commit("fix: off by one in retries", "src/retry.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);

    assert_eq!(decisions[0].next_version.to_string(), "0.1.0");
}

#[test]
fn test_custom_rules_map_fix_to_minor() {
    let mut fixture = Fixture::new();
    fixture.commit("fix: patch the parser", "src/parser.rs");

    let mut mapping = HashMap::new();
    mapping.insert("minor".to_string(), vec!["feat".to_string(), "fix".to_string()]);
    let rules = ReleaseRules::from_map(&mapping).unwrap();

    let repo = fixture.open();
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);

    let decision = &decisions[0];
    assert!(decision.new_release);
    assert_eq!(decision.next_version.to_string(), "0.1.0");

    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);
    assert_eq!(tagger.apply(decision).unwrap(), "v0.1.0");
}

#[test]
fn test_coalescing_many_patches_into_one() {
    let mut fixture = Fixture::new();
    for index in 0..5 {
        fixture.commit(&format!("fix: patch number {index}"), &format!("src/file{index}.rs"));
    }

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);

    // Five patch commits, exactly one patch bump.
    assert_eq!(decisions[0].next_version.to_string(), "0.0.1");
}

#[test]
fn test_prerelease_branch_first_release_and_idempotence() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: add retries", "src/retry.rs");
    fixture.commit("fix: off by one in retries", "src/retry.rs");
    fixture.commit("perf: cache the lookup", "src/cache.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let decisions = run_engine(&repo, vec![Branch::prerelease("main")], &[], &rules);

    let decision = &decisions[0];
    assert!(decision.new_release);
    assert_eq!(decision.next_version.to_string(), "0.1.0-main.1");

    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);
    assert_eq!(tagger.apply(decision).unwrap(), "v0.1.0-main.1");

    // A second run over the same state reports the same version, no release.
    let decisions = run_engine(&repo, vec![Branch::prerelease("main")], &[], &rules);
    let decision = &decisions[0];
    assert!(!decision.new_release);
    assert_eq!(decision.next_version.to_string(), "0.1.0-main.1");
    assert!(decision.commit_id.is_none());
}

#[test]
fn test_prerelease_counter_advances_within_same_triple() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: add retries", "src/retry.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);

    let decisions = run_engine(&repo, vec![Branch::prerelease("main")], &[], &rules);
    assert_eq!(decisions[0].next_version.to_string(), "0.1.0-main.1");
    tagger.apply(&decisions[0]).unwrap();

    // A patch toward the still-unreleased 0.1.0 advances the counter.
    fixture.commit("fix: harden the retry loop", "src/retry.rs");
    let decisions = run_engine(&repo, vec![Branch::prerelease("main")], &[], &rules);
    assert_eq!(decisions[0].next_version.to_string(), "0.1.0-main.2");
    tagger.apply(&decisions[0]).unwrap();

    // A breaking change moves the triple and restarts the counter.
    fixture.commit("feat!: replace the public api", "src/api.rs");
    let decisions = run_engine(&repo, vec![Branch::prerelease("main")], &[], &rules);
    assert_eq!(decisions[0].next_version.to_string(), "1.0.0-main.1");
}

#[test]
fn test_release_on_top_of_prior_stable_tag() {
    let mut fixture = Fixture::new();
    let tagged = fixture.commit("feat: the 1.0 surface", "src/lib.rs");
    fixture.lightweight_tag("v1.0.0", tagged);
    fixture.commit("feat: pagination", "src/page.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);

    let decision = &decisions[0];
    assert_eq!(decision.prior_version.to_string(), "1.0.0");
    assert_eq!(decision.next_version.to_string(), "1.1.0");
    assert!(decision.new_release);
}

#[test]
fn test_monorepo_attribution_splits_decisions() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: foo grows a feature", "foo/a");
    fixture.commit("fix: foo loses a bug", "foo/b");
    fixture.commit("feat!: bar breaks its api", "bar/x");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let projects =
        vec![Project::new("foo", &["./foo".to_string()]), Project::new("bar", &["./bar".to_string()])];
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &projects, &rules);

    assert_eq!(decisions.len(), 2);

    let foo = &decisions[0];
    assert_eq!(foo.project.as_deref(), Some("foo"));
    assert_eq!(foo.next_version.to_string(), "0.1.0");

    let bar = &decisions[1];
    assert_eq!(bar.project.as_deref(), Some("bar"));
    assert_eq!(bar.next_version.to_string(), "1.0.0");

    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);
    assert_eq!(tagger.apply(foo).unwrap(), "foo-v0.1.0");
    assert_eq!(tagger.apply(bar).unwrap(), "bar-v1.0.0");

    // Scoped tags feed back into the next run: nothing new to release.
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &projects, &rules);
    assert!(decisions.iter().all(|d| !d.new_release));
}

#[test]
fn test_monorepo_commit_outside_all_projects_is_ignored() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: docs tooling", "tools/gen.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let projects = vec![Project::new("foo", &["foo".to_string()])];
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &projects, &rules);

    assert!(!decisions[0].new_release);
    assert_eq!(decisions[0].next_version.to_string(), "0.0.0");
}

#[test]
fn test_prerelease_promotion_on_merge() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: the first surface", "src/lib.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);

    // First run releases 0.1.0 from main.
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);
    assert_eq!(decisions[0].next_version.to_string(), "0.1.0");
    tagger.apply(&decisions[0]).unwrap();

    // A breaking change lands on the rc branch.
    fixture.branch("rc");
    fixture.commit("feat!: replace the public api", "src/api.rs");

    let branches = vec![Branch::stable("main"), Branch::prerelease("rc")];
    let decisions = run_engine(&repo, branches.clone(), &[], &rules);

    let main = decisions.iter().find(|d| d.branch == "main").unwrap();
    assert!(!main.new_release);

    let rc = decisions.iter().find(|d| d.branch == "rc").unwrap();
    assert_eq!(rc.next_version.to_string(), "1.0.0-rc.1");
    tagger.apply(rc).unwrap();

    // Merging rc into main promotes the prerelease to 1.0.0.
    fixture.merge_into("main", "rc");
    let decisions = run_engine(&repo, branches, &[], &rules);

    let main = decisions.iter().find(|d| d.branch == "main").unwrap();
    assert!(main.new_release);
    assert_eq!(main.prior_version.to_string(), "0.1.0");
    assert_eq!(main.next_version.to_string(), "1.0.0");

    let rc = decisions.iter().find(|d| d.branch == "rc").unwrap();
    assert!(!rc.new_release);
}

#[test]
fn test_successive_releases_are_strictly_increasing() {
    let mut fixture = Fixture::new();
    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let tagger = Tagger::new(&repo, "v", TagMode::Annotated);

    let mut previous = None;
    let messages = [
        "fix: first patch",
        "feat: first feature",
        "feat!: breaking rework",
        "fix: cleanup after rework",
    ];

    for (index, message) in messages.iter().enumerate() {
        fixture.commit(message, &format!("src/step{index}.rs"));

        let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);
        let decision = &decisions[0];
        assert!(decision.new_release, "step {index} should release");

        if let Some(previous) = &previous {
            assert_eq!(
                decision.next_version.cmp_precedence(previous),
                std::cmp::Ordering::Greater,
                "versions must increase strictly"
            );
        }
        tagger.apply(decision).unwrap();
        previous = Some(decision.next_version.clone());
    }
}

#[test]
fn test_unknown_branch_yields_annotated_no_release() {
    let fixture = Fixture::new();
    let repo = fixture.open();
    let rules = ReleaseRules::default();

    let decisions = run_engine(&repo, vec![Branch::stable("develop")], &[], &rules);

    let decision = &decisions[0];
    assert!(!decision.new_release);
    assert_eq!(decision.prior_version.to_string(), "0.0.0");
    assert!(decision.note.as_deref().unwrap_or("").contains("develop"));
}

#[test]
fn test_cancellation_aborts_the_run() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: something", "src/lib.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let cancel = CancelToken::new();
    cancel.cancel();

    let engine = ReleaseEngine::new(
        &repo,
        vec![Branch::stable("main")],
        &[],
        &rules,
        "v",
        None,
        cancel,
    )
    .unwrap();

    assert!(matches!(engine.run(), Err(EngineError::Cancelled)));
}

#[test]
fn test_tagger_refuses_duplicate_tags() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: something", "src/lib.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let decisions = run_engine(&repo, vec![Branch::stable("main")], &[], &rules);

    let tagger = Tagger::new(&repo, "v", TagMode::Lightweight);
    tagger.apply(&decisions[0]).unwrap();

    let err = tagger.apply(&decisions[0]).unwrap_err();
    assert!(err.to_string().contains("already exists"), "got: {err}");
}

#[test]
fn test_build_metadata_is_applied_to_releases() {
    let mut fixture = Fixture::new();
    fixture.commit("feat: something", "src/lib.rs");

    let repo = fixture.open();
    let rules = ReleaseRules::default();
    let engine = ReleaseEngine::new(
        &repo,
        vec![Branch::stable("main")],
        &[],
        &rules,
        "v",
        Some("build.7"),
        CancelToken::new(),
    )
    .unwrap();

    let decisions = engine.run().unwrap();
    assert_eq!(decisions[0].next_version.to_string(), "0.1.0+build.7");
}
