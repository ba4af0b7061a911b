#[allow(clippy::unwrap_used)]
#[allow(clippy::panic)]
#[cfg(test)]
mod repo_tests {
    use std::fs;
    use std::path::Path;

    use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};
    use semrel_git_tools::{Repo, RepoError, Signer, SigningError, TagMode};
    use tempfile::TempDir;

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
            self.clock += 60;
            Signature::new("Release Bot", "bot@example.com", &Time::new(self.clock, 0)).unwrap()
        }

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

        fn branch_at(&self, name: &str, target: Oid) {
            let commit = self.repo.find_commit(target).unwrap();
            self.repo.branch(name, &commit, false).unwrap();
        }

        /// Creates a two-parent merge commit on `target`, taking the tree
        /// from `take_tree_of`.
        fn merge(&mut self, target: &str, source: &str, take_tree_of: &str) -> Oid {
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
            let tree_source = if take_tree_of == target { &ours } else { &theirs };
            let tree = tree_source.tree().unwrap();

            let oid = self
                .repo
                .commit(
                    Some("HEAD"),
                    &sig,
                    &sig,
                    &format!("Merge branch '{source}'"),
                    &tree,
                    &[&ours, &theirs],
                )
                .unwrap();
            self.checkout(target);
            oid
        }

        fn open(&self) -> Repo {
            Repo::open(self.dir.path().to_str().unwrap()).unwrap()
        }
    }

    #[test]
    fn test_repo_open() {
        let fixture = Fixture::new();
        let repo = fixture.open();

        let repo_path = fs::canonicalize(repo.get_repo_path()).unwrap();
        let expected_path = fs::canonicalize(fixture.dir.path()).unwrap();
        assert_eq!(repo_path, expected_path);
    }

    #[test]
    fn test_repo_open_missing_path_fails() {
        assert!(Repo::open("/definitely/not/a/repository").is_err());
    }

    #[test]
    fn test_config_sets_identity() {
        let fixture = Fixture::new();
        let repo = fixture.open();

        repo.config("Someone Else", "else@example.com").unwrap();

        let config = fixture.repo.config().unwrap().snapshot().unwrap();
        assert_eq!(config.get_str("user.name").unwrap(), "Someone Else");
        assert_eq!(config.get_str("user.email").unwrap(), "else@example.com");
    }

    #[test]
    fn test_find_branch_tip() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("chore: initial commit", "README.md");

        let repo = fixture.open();
        assert_eq!(repo.find_branch_tip("main").unwrap(), Some(head.to_string()));
        assert_eq!(repo.find_branch_tip("develop").unwrap(), None);
    }

    #[test]
    fn test_find_branch_tip_on_unborn_head() {
        let fixture = Fixture::new();
        let repo = fixture.open();

        assert_eq!(repo.find_branch_tip("main").unwrap(), None);
    }

    #[test]
    fn test_tags_lightweight_and_annotated() {
        let mut fixture = Fixture::new();
        let first = fixture.commit("chore: initial commit", "README.md");
        let second = fixture.commit("feat: something", "src/lib.rs");

        // One lightweight, one annotated.
        fixture.repo.reference("refs/tags/v0.1.0", first, false, "tag").unwrap();
        let sig = fixture.signature();
        let target = fixture.repo.find_commit(second).unwrap();
        fixture.repo.tag("v0.2.0", target.as_object(), &sig, "0.2.0", false).unwrap();

        let repo = fixture.open();
        let mut tags = repo.tags().unwrap();
        tags.sort_by(|a, b| a.ref_name.cmp(&b.ref_name));

        assert_eq!(tags.len(), 2);

        assert_eq!(tags[0].ref_name, "v0.1.0");
        assert_eq!(tags[0].commit_id, first.to_string());
        assert!(tags[0].tagged_at.is_none());

        // The annotated tag peels to its commit and carries a tagger time.
        assert_eq!(tags[1].ref_name, "v0.2.0");
        assert_eq!(tags[1].commit_id, second.to_string());
        assert!(tags[1].tagged_at.is_some());
    }

    #[test]
    fn test_commits_between_full_history_is_oldest_first() {
        let mut fixture = Fixture::new();
        let a = fixture.commit("chore: a", "a.txt");
        let b = fixture.commit("chore: b", "b.txt");
        let c = fixture.commit("chore: c", "c.txt");

        let repo = fixture.open();
        let tip = repo.find_branch_tip("main").unwrap().unwrap();
        let window = repo.commits_between(&tip, None, false).unwrap();

        let ids: Vec<&str> = window.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec![a.to_string(), b.to_string(), c.to_string()]);

        assert!(window[0].parent_ids.is_empty());
        assert_eq!(window[1].parent_ids, vec![a.to_string()]);
        assert_eq!(window[2].message, "chore: c");
        assert!(window[0].when < window[1].when);
    }

    #[test]
    fn test_commits_between_excludes_base_and_its_ancestors() {
        let mut fixture = Fixture::new();
        fixture.commit("chore: a", "a.txt");
        let b = fixture.commit("chore: b", "b.txt");
        let c = fixture.commit("chore: c", "c.txt");

        let repo = fixture.open();
        let tip = repo.find_branch_tip("main").unwrap().unwrap();
        let window = repo.commits_between(&tip, Some(&b.to_string()), false).unwrap();

        let ids: Vec<&str> = window.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec![c.to_string()]);
    }

    #[test]
    fn test_commits_between_orders_merged_side_branches_once() {
        let mut fixture = Fixture::new();
        let a = fixture.commit("chore: a", "a.txt");
        fixture.branch_at("side", a);
        let b = fixture.commit("chore: b", "b.txt");
        fixture.checkout("side");
        let c = fixture.commit("chore: c", "c.txt");
        let m = fixture.merge("main", "side", "side");

        let repo = fixture.open();
        let tip = repo.find_branch_tip("main").unwrap().unwrap();
        let window = repo.commits_between(&tip, None, false).unwrap();

        // Parents before children; b (earlier) before c (later); the merge
        // appears exactly once, last.
        let ids: Vec<&str> = window.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec![a.to_string(), b.to_string(), c.to_string(), m.to_string()]);

        let window = repo.commits_between(&tip, Some(&a.to_string()), false).unwrap();
        let ids: Vec<&str> = window.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec![b.to_string(), c.to_string(), m.to_string()]);
    }

    #[test]
    fn test_changed_paths_against_first_parent() {
        let mut fixture = Fixture::new();
        let root = fixture.commit("chore: root", "README.md");
        let next = fixture.commit("feat: add module", "src/module.rs");

        let repo = fixture.open();

        // Root commits diff against the empty tree.
        let paths = repo.changed_paths(&root.to_string()).unwrap();
        assert_eq!(paths, vec!["README.md".to_string()]);

        let paths = repo.changed_paths(&next.to_string()).unwrap();
        assert_eq!(paths, vec!["src/module.rs".to_string()]);
    }

    #[test]
    fn test_changed_paths_of_noop_merge_is_empty() {
        let mut fixture = Fixture::new();
        let a = fixture.commit("chore: a", "a.txt");
        fixture.branch_at("side", a);
        fixture.checkout("side");
        fixture.commit("chore: c", "c.txt");
        fixture.checkout("main");
        fixture.commit("chore: b", "b.txt");

        // The merge keeps main's tree: nothing differs from the first parent.
        let m = fixture.merge("main", "side", "main");

        let repo = fixture.open();
        let paths = repo.changed_paths(&m.to_string()).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_window_collects_changed_paths_on_request() {
        let mut fixture = Fixture::new();
        fixture.commit("feat: foo", "foo/a");
        fixture.commit("fix: bar", "bar/b");

        let repo = fixture.open();
        let tip = repo.find_branch_tip("main").unwrap().unwrap();

        let window = repo.commits_between(&tip, None, true).unwrap();
        assert_eq!(window[0].changed_paths, vec!["foo/a".to_string()]);
        assert_eq!(window[1].changed_paths, vec!["bar/b".to_string()]);

        let window = repo.commits_between(&tip, None, false).unwrap();
        assert!(window.iter().all(|record| record.changed_paths.is_empty()));
    }

    #[test]
    fn test_tag_commit_lightweight() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let repo = fixture.open();
        repo.tag_commit("v1.0.0", &head.to_string(), TagMode::Lightweight, "1.0.0", None)
            .unwrap();

        assert!(repo.tag_exists("v1.0.0"));
        let reference = fixture.repo.find_reference("refs/tags/v1.0.0").unwrap();
        // Lightweight: the ref points directly at the commit.
        assert_eq!(reference.target().unwrap(), head);
    }

    #[test]
    fn test_tag_commit_annotated() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let repo = fixture.open();
        repo.tag_commit("v1.0.0", &head.to_string(), TagMode::Annotated, "1.0.0", None).unwrap();

        let reference = fixture.repo.find_reference("refs/tags/v1.0.0").unwrap();
        let tag = fixture.repo.find_tag(reference.target().unwrap()).unwrap();
        assert_eq!(tag.target_id(), head);
        assert_eq!(tag.message().unwrap().trim_end(), "1.0.0");
    }

    #[test]
    fn test_tag_commit_duplicate_guard() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let repo = fixture.open();
        repo.tag_commit("v1.0.0", &head.to_string(), TagMode::Annotated, "1.0.0", None).unwrap();

        let err = repo
            .tag_commit("v1.0.0", &head.to_string(), TagMode::Annotated, "1.0.0", None)
            .unwrap_err();
        assert!(matches!(err, RepoError::TagAlreadyExists { name } if name == "v1.0.0"));
    }

    struct FakeSigner;

    impl Signer for FakeSigner {
        fn sign(&self, payload: &[u8]) -> Result<String, SigningError> {
            if !payload.starts_with(b"object ") {
                return Err(SigningError("unexpected payload".to_string()));
            }
            Ok("-----BEGIN PGP SIGNATURE-----\n\nZmFrZXNpZw==\n-----END PGP SIGNATURE-----\n"
                .to_string())
        }
    }

    struct FailingSigner;

    impl Signer for FailingSigner {
        fn sign(&self, _payload: &[u8]) -> Result<String, SigningError> {
            Err(SigningError("no key loaded".to_string()))
        }
    }

    #[test]
    fn test_tag_commit_signed() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let repo = fixture.open();
        repo.tag_commit("v1.0.0", &head.to_string(), TagMode::Annotated, "1.0.0", Some(&FakeSigner))
            .unwrap();

        // The hand-written tag object must still parse as a tag and peel to
        // the right commit, with the signature embedded in the message.
        let reference = fixture.repo.find_reference("refs/tags/v1.0.0").unwrap();
        let tag = fixture.repo.find_tag(reference.target().unwrap()).unwrap();
        assert_eq!(tag.target_id(), head);
        assert!(tag.message().unwrap().contains("BEGIN PGP SIGNATURE"));
        assert_eq!(tag.name().unwrap(), "v1.0.0");
    }

    #[test]
    fn test_tag_commit_signing_failure_is_fatal() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let repo = fixture.open();
        let err = repo
            .tag_commit(
                "v1.0.0",
                &head.to_string(),
                TagMode::Annotated,
                "1.0.0",
                Some(&FailingSigner),
            )
            .unwrap_err();

        assert!(matches!(err, RepoError::SigningFailed(_)));
        // No ref is left behind on failure.
        assert!(!repo.tag_exists("v1.0.0"));
    }

    #[test]
    fn test_push_tag_to_local_remote() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let remote_dir = TempDir::new().unwrap();
        Repository::init_bare(remote_dir.path()).unwrap();
        fixture.repo.remote("origin", remote_dir.path().to_str().unwrap()).unwrap();

        let repo = fixture.open();
        repo.tag_commit("v1.0.0", &head.to_string(), TagMode::Lightweight, "1.0.0", None)
            .unwrap();
        repo.push_tag("origin", "v1.0.0", None).unwrap();

        let remote = Repository::open_bare(remote_dir.path()).unwrap();
        let reference = remote.find_reference("refs/tags/v1.0.0").unwrap();
        assert_eq!(reference.target().unwrap(), head);
    }

    #[test]
    fn test_push_tag_to_missing_remote_fails() {
        let mut fixture = Fixture::new();
        let head = fixture.commit("feat: something", "src/lib.rs");

        let repo = fixture.open();
        repo.tag_commit("v1.0.0", &head.to_string(), TagMode::Lightweight, "1.0.0", None)
            .unwrap();

        assert!(matches!(repo.push_tag("origin", "v1.0.0", None), Err(RepoError::RemoteError(_))));
    }
}
