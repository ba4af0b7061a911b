//! # Git Repository Module
//!
//! This module provides the main functionality for working with Git
//! repositories. It offers a high-level API that wraps the libgit2 library,
//! focused on what release automation needs.
//!
//! The main struct is `Repo`, which represents a Git repository and provides
//! methods for resolving branches, enumerating tags, walking history windows
//! deterministically, computing first-parent diffs, and creating or pushing
//! tags.
//!
//! ## Key Features
//!
//! - Repository opening and (token-authenticated) cloning
//! - Branch tip resolution across local and remote-tracking refs
//! - Tag enumeration with annotated-tag peeling
//! - Deterministic oldest-first history windows between two commits
//! - Changed-path computation against the first parent
//! - Annotated, lightweight and signed tag creation with a duplicate guard
//! - Pushing single tag refs with credential callbacks

use git2::{
    build::RepoBuilder, BranchType, Commit, Cred, Error as Git2Error, ErrorCode, FetchOptions,
    ObjectType, Oid, PushOptions, RemoteCallbacks, Signature,
};
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fs::canonicalize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{CommitRecord, Repo, RepoError, Signer, TagMode, TagRecord};

/// Canonicalizes a path string to its absolute form
///
/// # Errors
///
/// This function will return an error if the path does not exist or cannot
/// be resolved.
fn canonicalize_path(path: &str) -> Result<String, RepoError> {
    let location = PathBuf::from(path);
    let path = canonicalize(location.as_os_str()).map_err(RepoError::CanonicalPathFailure)?;
    Ok(path.display().to_string())
}

/// Creates SSH credentials for Git operations
///
/// This is an internal helper used by clone and push when no access token is
/// configured.
///
/// # Arguments
///
/// * `username_from_url` - Optional username extracted from the URL
/// * `custom_key_paths` - Optional custom SSH key paths to try
///
/// # Returns
///
/// * `Result<Cred, Git2Error>` - SSH credentials or an error
fn create_ssh_credentials(
    username_from_url: Option<&str>,
    custom_key_paths: Option<&Vec<PathBuf>>,
) -> Result<Cred, Git2Error> {
    // Get the list of key paths to try
    let key_paths = match custom_key_paths {
        Some(paths) => paths.clone(),
        None => {
            // Use default paths based on home directory (cross-platform)
            if let Some(home_dir) = dirs::home_dir() {
                vec![
                    home_dir.join(".ssh").join("id_ed25519"), // Ed25519 (preferred by GitHub)
                    home_dir.join(".ssh").join("id_rsa"),     // RSA (widely used)
                    home_dir.join(".ssh").join("id_ecdsa"),   // ECDSA
                    home_dir.join(".ssh").join("id_dsa"),     // DSA (legacy)
                ]
            } else {
                // Fallback if we can't find home directory
                return Err(Git2Error::from_str(
                    "Could not determine home directory for SSH keys",
                ));
            }
        }
    };

    // Fallback to environment user or "git" when the URL carries no username
    let username = match username_from_url {
        Some(name) => name.to_string(),
        None => std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "git".to_string()),
    };

    // Try each key in order until one works
    for key_path in key_paths {
        if key_path.exists() {
            if let Ok(cred) = Cred::ssh_key(&username, None, &key_path, None) {
                return Ok(cred);
            }
        }
    }

    // If all specific attempts fail, try the SSH agent
    Cred::ssh_key_from_agent(&username)
}

/// Formats a git2 signature the way tag objects expect it:
/// `Name <email> <epoch-seconds> <offset>`
fn format_signature(sig: &Signature<'_>) -> String {
    let when = sig.when();
    let offset = when.offset_minutes();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset_hours = offset.abs() / 60;
    let offset_minutes = offset.abs() % 60;

    format!(
        "{} <{}> {} {}{:02}{:02}",
        sig.name().unwrap_or(""),
        sig.email().unwrap_or(""),
        when.seconds(),
        sign,
        offset_hours,
        offset_minutes
    )
}

impl Repo {
    /// Opens an existing Git repository at the specified path
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the existing repository
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The path cannot be canonicalized
    /// - The path does not contain a valid Git repository
    ///
    /// # Examples
    ///
    /// ```
    /// use semrel_git_tools::Repo;
    ///
    /// let repo = Repo::open("./my-project").expect("Failed to open repository");
    /// ```
    #[allow(clippy::arc_with_non_send_sync)]
    pub fn open(path: &str) -> Result<Self, RepoError> {
        let local_path = canonicalize_path(path)?;
        let repo = git2::Repository::open(path).map_err(RepoError::OpenRepoFailure)?;

        Ok(Self { repo: Arc::new(repo), local_path: PathBuf::from(local_path) })
    }

    /// Clones a Git repository from a URL to a local path
    ///
    /// When an access token is given it is presented as a plaintext
    /// credential; otherwise SSH keys from the usual locations are tried.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL of the repository to clone
    /// * `path` - The local path where the repository should be cloned
    /// * `access_token` - Optional token for HTTPS authentication
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The path cannot be canonicalized
    /// - The URL is invalid or unreachable
    /// - Authentication is required but not provided or fails
    #[allow(clippy::arc_with_non_send_sync)]
    pub fn clone(url: &str, path: &str, access_token: Option<&str>) -> Result<Self, RepoError> {
        let token = access_token.map(str::to_string);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, _allowed_types| {
            match &token {
                Some(token) => {
                    Cred::userpass_plaintext(username_from_url.unwrap_or("oauth2"), token)
                }
                None => create_ssh_credentials(username_from_url, None),
            }
        });

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, Path::new(path))
            .map_err(RepoError::CloneRepoFailure)?;

        let local_path = canonicalize_path(path)?;
        Ok(Self { repo: Arc::new(repo), local_path: PathBuf::from(local_path) })
    }

    /// Gets the local path of the repository
    pub fn get_repo_path(&self) -> &Path {
        self.local_path.as_path()
    }

    /// Configures the repository with user information
    ///
    /// The configured identity is what annotated tags carry as their tagger.
    ///
    /// # Arguments
    ///
    /// * `username` - The Git user name
    /// * `email` - The Git user email
    ///
    /// # Errors
    ///
    /// This function will return an error if the repository configuration
    /// cannot be accessed or written.
    ///
    /// # Examples
    ///
    /// ```
    /// use semrel_git_tools::Repo;
    ///
    /// let repo = Repo::open("./my-repo").expect("Failed to open repository");
    /// repo.config("Release Bot", "bot@example.com").expect("Failed to configure repository");
    /// ```
    pub fn config(&self, username: &str, email: &str) -> Result<&Self, RepoError> {
        let mut config = self.repo.config().map_err(RepoError::ConfigError)?;
        config.set_str("user.name", username)?;
        config.set_str("user.email", email)?;
        Ok(self)
    }

    /// Resolves a branch name to the commit id of its tip
    ///
    /// Local branches win over remote-tracking ones; a branch that only
    /// exists on `origin` still resolves, so freshly cloned repositories work
    /// without checking every branch out.
    ///
    /// # Arguments
    ///
    /// * `branch_name` - The short branch name (e.g. `main`)
    ///
    /// # Returns
    ///
    /// * `Ok(Some(commit_id))` when the branch exists
    /// * `Ok(None)` when neither a local nor an `origin/` ref exists
    ///
    /// # Errors
    ///
    /// This function will return an error if the branch lookup fails for a
    /// reason other than the branch being absent, or the ref cannot be
    /// peeled to a commit.
    pub fn find_branch_tip(&self, branch_name: &str) -> Result<Option<String>, RepoError> {
        match self.repo.find_branch(branch_name, BranchType::Local) {
            Ok(branch) => {
                let commit = branch.get().peel_to_commit().map_err(RepoError::PeelError)?;
                return Ok(Some(commit.id().to_string()));
            }
            Err(e) if e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(RepoError::BranchError(e)),
        }

        let remote_name = format!("origin/{branch_name}");
        match self.repo.find_branch(&remote_name, BranchType::Remote) {
            Ok(branch) => {
                let commit = branch.get().peel_to_commit().map_err(RepoError::PeelError)?;
                Ok(Some(commit.id().to_string()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(RepoError::BranchError(e)),
        }
    }

    /// Gets all tags in the repository
    ///
    /// Annotated tags are peeled to the commit they reference and carry
    /// their tagger timestamp; lightweight tags resolve through the ref
    /// target directly. Tags that do not ultimately point at a commit are
    /// skipped.
    ///
    /// # Errors
    ///
    /// This function will return an error if tag references cannot be
    /// enumerated or are corrupted.
    ///
    /// # Examples
    ///
    /// ```
    /// use semrel_git_tools::Repo;
    ///
    /// let repo = Repo::open("./my-repo").expect("Failed to open repository");
    /// for tag in repo.tags().expect("Failed to list tags") {
    ///     println!("{} ({})", tag.ref_name, tag.commit_id);
    /// }
    /// ```
    pub fn tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        let mut tags = Vec::new();

        // Get all references matching "refs/tags/*"
        let tag_refs =
            self.repo.references_glob("refs/tags/*").map_err(RepoError::ReferenceError)?;

        for tag_ref_result in tag_refs {
            let tag_ref = tag_ref_result.map_err(RepoError::TagError)?;

            // Get the reference name (e.g., "refs/tags/v1.0.0")
            let Some(ref_name) = tag_ref.name() else {
                log::debug!("skipping tag reference with non-utf8 name");
                continue;
            };

            let Some(tag_name) = ref_name.strip_prefix("refs/tags/") else {
                continue;
            };

            // Get the target OID for this reference
            let Some(target_oid) = tag_ref.target() else {
                log::debug!("skipping symbolic tag reference {ref_name}");
                continue;
            };

            // If the reference is a tag object (annotated tag), dereference
            // it to get the commit and remember the tagger time.
            let record = if let Ok(tag) = self.repo.find_tag(target_oid) {
                let peeled = tag
                    .target()
                    .and_then(|object| object.peel_to_commit().map(|commit| commit.id()));
                match peeled {
                    Ok(commit_id) => TagRecord {
                        ref_name: tag_name.to_string(),
                        commit_id: commit_id.to_string(),
                        tagged_at: tag.tagger().map(|sig| sig.when().seconds()),
                    },
                    Err(e) => {
                        log::warn!("skipping unreadable tag {tag_name}: {e}");
                        continue;
                    }
                }
            } else {
                // Lightweight tags must point at a commit to be useful here.
                match self.repo.find_commit(target_oid) {
                    Ok(commit) => TagRecord {
                        ref_name: tag_name.to_string(),
                        commit_id: commit.id().to_string(),
                        tagged_at: None,
                    },
                    Err(_) => {
                        log::debug!("skipping non-commit tag {tag_name}");
                        continue;
                    }
                }
            };

            tags.push(record);
        }

        Ok(tags)
    }

    /// Gets the commits reachable from `tip` but not from `base`
    ///
    /// The sequence is oldest first and deterministic: parents always come
    /// before their children, and ties within a topological layer are broken
    /// by committer timestamp ascending, then commit id ascending. The base
    /// commit itself and all of its ancestors are excluded; merged side
    /// branches appear exactly once.
    ///
    /// libgit2's own TOPOLOGICAL sort leaves tie order unspecified, so the
    /// walk materializes the window membership and re-layers it explicitly.
    ///
    /// # Arguments
    ///
    /// * `tip` - Commit id of the window's upper bound (inclusive)
    /// * `base` - Optional commit id of the lower bound (exclusive)
    /// * `collect_paths` - Whether to compute first-parent changed paths
    ///
    /// # Errors
    ///
    /// This function will return an error if either id cannot be parsed or
    /// the walk touches corrupted objects.
    pub fn commits_between(
        &self,
        tip: &str,
        base: Option<&str>,
        collect_paths: bool,
    ) -> Result<Vec<CommitRecord>, RepoError> {
        let tip_oid = Oid::from_str(tip).map_err(RepoError::CommitOidError)?;

        let mut revwalk = self.repo.revwalk().map_err(RepoError::RevWalkError)?;
        revwalk.push(tip_oid).map_err(RepoError::RevWalkError)?;

        if let Some(base) = base {
            let base_oid = Oid::from_str(base).map_err(RepoError::CommitOidError)?;
            // Hide any commits reachable from the base. This effectively
            // gives us commits that are in `tip` but not in `base`.
            revwalk.hide(base_oid).map_err(RepoError::RevWalkError)?;
        }

        // Materialize the window membership first.
        let mut members = HashSet::new();
        for oid_result in revwalk {
            members.insert(oid_result.map_err(RepoError::CommitOidError)?);
        }

        // Build the parent graph restricted to the window.
        let mut times: HashMap<Oid, i64> = HashMap::with_capacity(members.len());
        let mut pending: HashMap<Oid, usize> = HashMap::new();
        let mut children: HashMap<Oid, Vec<Oid>> = HashMap::new();
        let mut ready = BinaryHeap::new();

        for &oid in &members {
            let commit = self.repo.find_commit(oid).map_err(RepoError::CommitError)?;
            times.insert(oid, commit.time().seconds());

            let mut in_window_parents = 0;
            for parent in commit.parent_ids() {
                if members.contains(&parent) {
                    in_window_parents += 1;
                    children.entry(parent).or_default().push(oid);
                }
            }

            if in_window_parents == 0 {
                ready.push(Reverse((commit.time().seconds(), oid)));
            } else {
                pending.insert(oid, in_window_parents);
            }
        }

        // Emit layer by layer; the heap keeps (time, id) order among the
        // commits whose in-window parents have all been emitted.
        let mut records = Vec::with_capacity(members.len());
        while let Some(Reverse((_, oid))) = ready.pop() {
            let commit = self.repo.find_commit(oid).map_err(RepoError::CommitError)?;
            records.push(self.build_record(&commit, collect_paths));

            if let Some(kids) = children.remove(&oid) {
                for kid in kids {
                    if let Some(count) = pending.get_mut(&kid) {
                        *count -= 1;
                        if *count == 0 {
                            pending.remove(&kid);
                            ready.push(Reverse((times[&kid], kid)));
                        }
                    }
                }
            }
        }

        Ok(records)
    }

    /// Gets the destination paths a commit changed against its first parent
    ///
    /// Root commits diff against the empty tree. Paths use forward slashes.
    ///
    /// # Errors
    ///
    /// This function will return an error if trees cannot be read or the
    /// diff fails.
    pub fn changed_paths(&self, commit_id: &str) -> Result<Vec<String>, RepoError> {
        let oid = Oid::from_str(commit_id).map_err(RepoError::CommitOidError)?;
        let commit = self.repo.find_commit(oid).map_err(RepoError::CommitError)?;
        self.changed_paths_of(&commit)
    }

    fn changed_paths_of(&self, commit: &Commit<'_>) -> Result<Vec<String>, RepoError> {
        let tree = commit.tree().map_err(RepoError::GitFailure)?;

        // For non-root commits, diff against the first parent
        let parent_tree = if commit.parent_count() == 0 {
            None
        } else {
            let parent = commit.parent(0).map_err(RepoError::GitFailure)?;
            Some(parent.tree().map_err(RepoError::GitFailure)?)
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(RepoError::DiffError)?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                paths.push(path.to_string_lossy().replace('\\', "/"));
            }
        }

        Ok(paths)
    }

    fn build_record(&self, commit: &Commit<'_>, collect_paths: bool) -> CommitRecord {
        let changed_paths = if collect_paths {
            match self.changed_paths_of(commit) {
                Ok(paths) => paths,
                Err(e) => {
                    // An unreadable diff must not sink the whole window; the
                    // commit simply attributes to nothing.
                    log::warn!("failed to diff commit {}: {e}", commit.id());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        CommitRecord {
            id: commit.id().to_string(),
            when: chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
                .unwrap_or(chrono::DateTime::UNIX_EPOCH),
            parent_ids: commit.parent_ids().map(|id| id.to_string()).collect(),
            message: commit.message().unwrap_or("").to_string(),
            changed_paths,
        }
    }

    /// Returns true when a tag ref with this short name exists
    pub fn tag_exists(&self, name: &str) -> bool {
        self.repo.find_reference(&format!("refs/tags/{name}")).is_ok()
    }

    /// Creates a tag pointing at a commit
    ///
    /// In [`TagMode::Annotated`] a full tag object is written, carrying the
    /// repository's configured identity as the tagger and `message` as the
    /// tag message; with a [`Signer`] the payload is signed before the
    /// object is written. In [`TagMode::Lightweight`] a bare ref is created
    /// and `message` and `signer` are ignored.
    ///
    /// # Arguments
    ///
    /// * `name` - The short tag name (e.g. `v1.2.3`)
    /// * `commit_id` - The commit the tag should point at
    /// * `mode` - Annotated or lightweight
    /// * `message` - The annotated tag message
    /// * `signer` - Optional payload signer for annotated tags
    ///
    /// # Returns
    ///
    /// * The id of the created tag object (annotated) or the commit id
    ///   (lightweight)
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - A ref with this name already exists ([`RepoError::TagAlreadyExists`])
    /// - The commit id cannot be resolved
    /// - Signing fails ([`RepoError::SigningFailed`])
    /// - The tag object or ref cannot be written
    pub fn tag_commit(
        &self,
        name: &str,
        commit_id: &str,
        mode: TagMode,
        message: &str,
        signer: Option<&dyn Signer>,
    ) -> Result<String, RepoError> {
        let ref_name = format!("refs/tags/{name}");
        if self.repo.find_reference(&ref_name).is_ok() {
            return Err(RepoError::TagAlreadyExists { name: name.to_string() });
        }

        let oid = Oid::from_str(commit_id).map_err(RepoError::CommitOidError)?;
        let commit = self.repo.find_commit(oid).map_err(RepoError::CommitError)?;

        match mode {
            TagMode::Lightweight => {
                self.repo
                    .reference(&ref_name, oid, false, &format!("tag: {name}"))
                    .map_err(RepoError::CreateTagError)?;
                Ok(oid.to_string())
            }
            TagMode::Annotated => {
                let tagger = self.repo.signature().map_err(RepoError::SignatureError)?;
                match signer {
                    None => {
                        let tag_oid = self
                            .repo
                            .tag(name, commit.as_object(), &tagger, message, false)
                            .map_err(RepoError::CreateTagError)?;
                        Ok(tag_oid.to_string())
                    }
                    Some(signer) => {
                        self.create_signed_tag(name, &ref_name, oid, &tagger, message, signer)
                    }
                }
            }
        }
    }

    /// Writes a signed annotated tag by hand
    ///
    /// libgit2 has no signed-tag helper, so the raw tag payload is built,
    /// signed, and written to the object database with the armored signature
    /// appended.
    fn create_signed_tag(
        &self,
        name: &str,
        ref_name: &str,
        target: Oid,
        tagger: &Signature<'_>,
        message: &str,
        signer: &dyn Signer,
    ) -> Result<String, RepoError> {
        let mut payload = String::new();
        payload.push_str(&format!("object {target}\n"));
        payload.push_str("type commit\n");
        payload.push_str(&format!("tag {name}\n"));
        payload.push_str(&format!("tagger {}\n\n", format_signature(tagger)));
        payload.push_str(message);
        if !message.ends_with('\n') {
            payload.push('\n');
        }

        let signature = signer.sign(payload.as_bytes())?;

        let mut raw = payload;
        raw.push_str(&signature);
        if !signature.ends_with('\n') {
            raw.push('\n');
        }

        let odb = self.repo.odb().map_err(RepoError::OdbError)?;
        let tag_oid = odb.write(ObjectType::Tag, raw.as_bytes()).map_err(RepoError::OdbError)?;

        self.repo
            .reference(ref_name, tag_oid, false, &format!("tag: {name}"))
            .map_err(RepoError::CreateTagError)?;

        Ok(tag_oid.to_string())
    }

    /// Pushes a single tag ref to a remote
    ///
    /// # Arguments
    ///
    /// * `remote_name` - The name of the remote (e.g., "origin")
    /// * `tag_name` - The short name of the tag to push
    /// * `access_token` - Optional token for HTTPS authentication
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The specified remote does not exist
    /// - Authentication fails (SSH keys, credentials)
    /// - The remote rejects the ref update ([`RepoError::PushRejected`])
    pub fn push_tag(
        &self,
        remote_name: &str,
        tag_name: &str,
        access_token: Option<&str>,
    ) -> Result<(), RepoError> {
        let mut remote = self.repo.find_remote(remote_name).map_err(RepoError::RemoteError)?;

        let token = access_token.map(str::to_string);
        let rejection: RefCell<Option<(String, String)>> = RefCell::new(None);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, _allowed_types| match &token {
            Some(token) => Cred::userpass_plaintext(username_from_url.unwrap_or("oauth2"), token),
            None => create_ssh_credentials(username_from_url, None),
        });

        // The transport can succeed while the server still rejects the ref;
        // record per-ref status and surface it after the push.
        callbacks.push_update_reference(|refname, status| {
            if let Some(error_msg) = status {
                *rejection.borrow_mut() = Some((refname.to_string(), error_msg.to_string()));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/tags/{tag_name}:refs/tags/{tag_name}");
        remote.push(&[refspec.as_str()], Some(&mut push_options)).map_err(RepoError::PushError)?;

        if let Some((reference, reason)) = rejection.borrow_mut().take() {
            return Err(RepoError::PushRejected { reference, reason });
        }

        Ok(())
    }
}
