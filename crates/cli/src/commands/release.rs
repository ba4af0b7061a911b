//! The `semrel release` command.

use std::io::Write;

use anyhow::{bail, Context};

use semrel_git_tools::{Repo, TagMode};
use semrel_release_tools::{CancelToken, ReleaseEngine, Tagger};

use crate::cli::ReleaseArgs;
use crate::config::{self, RepoSource};
use crate::output::{self, CiFile};
use crate::signer::GpgSigner;

pub fn run(args: &ReleaseArgs) -> anyhow::Result<()> {
    let config = config::resolve(args)?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .context("cannot install interrupt handler")?;
    }

    // The clone directory lives exactly as long as the run; dropping the
    // guard removes it on every exit path.
    let mut clone_dir = None;
    let repo = match &config.repository {
        RepoSource::Path(path) => {
            Repo::open(path).with_context(|| format!("cannot open repository at {path}"))?
        }
        RepoSource::Url(url) => {
            let dir = tempfile::tempdir().context("cannot create clone directory")?;
            let target = dir
                .path()
                .to_str()
                .context("clone directory path is not valid UTF-8")?
                .to_string();
            let repo = Repo::clone(url, &target, config.access_token.as_deref())
                .with_context(|| format!("cannot clone {url}"))?;
            clone_dir = Some(dir);
            repo
        }
    };

    if let (Some(name), Some(email)) = (&config.git_name, &config.git_email) {
        repo.config(name, email).context("cannot configure tagging identity")?;
    }

    let engine = ReleaseEngine::new(
        &repo,
        config.branches.clone(),
        &config.projects,
        &config.rules,
        &config.tag_prefix,
        config.build_metadata.as_deref(),
        cancel,
    )?;
    let decisions = engine.run()?;

    let signer = match &config.gpg_key_path {
        Some(path) => Some(GpgSigner::new(path)?),
        None => None,
    };

    let mode = if config.lightweight_tags { TagMode::Lightweight } else { TagMode::Annotated };
    let mut tagger = Tagger::new(&repo, &config.tag_prefix, mode);
    if let Some(signer) = &signer {
        tagger = tagger.with_signer(signer);
    }
    if let Some(remote) = &config.remote_name {
        tagger = tagger.with_remote(remote, config.access_token.as_deref());
    }

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    let mut ci_file = CiFile::from_env()?;
    let mut failures = 0usize;

    for decision in &decisions {
        writeln!(stdout, "{}", output::decision_line(decision)?)?;
        if let Some(ci_file) = &mut ci_file {
            ci_file.emit(decision, &config.tag_prefix)?;
        }

        if !decision.new_release {
            continue;
        }
        if config.dry_run {
            log::info!(
                "dry run: would tag {} for branch {}",
                tagger.format(&decision.next_version, decision.project.as_deref()),
                decision.branch
            );
            continue;
        }

        // A tag that cannot be written only sinks its own decision.
        if let Err(e) = tagger.apply(decision) {
            log::error!("failed to tag branch {}: {e}", decision.branch);
            failures += 1;
        }
    }

    drop(clone_dir);

    if failures > 0 {
        bail!("{failures} release decision(s) could not be tagged");
    }
    Ok(())
}
