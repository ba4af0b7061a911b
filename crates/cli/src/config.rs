//! Layered run configuration.
//!
//! Loading is a pure pipeline: built-in defaults, then the configuration
//! file, then command-line flags, folded into one immutable [`RunConfig`]
//! value that the rest of the run borrows. Nothing here mutates global
//! state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

use semrel_release_tools::{Branch, Project};
use semrel_semver_tools::ReleaseRules;

use crate::cli::ReleaseArgs;

/// Where the repository under analysis comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    /// A local working copy
    Path(String),
    /// A remote URL, cloned into a scoped temporary directory
    Url(String),
}

/// The fully resolved, immutable configuration of one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub repository: RepoSource,
    pub branches: Vec<Branch>,
    pub rules: ReleaseRules,
    pub projects: Vec<Project>,
    pub tag_prefix: String,
    pub build_metadata: Option<String>,
    pub gpg_key_path: Option<PathBuf>,
    pub lightweight_tags: bool,
    pub dry_run: bool,
    pub remote_name: Option<String>,
    pub access_token: Option<String>,
    pub git_name: Option<String>,
    pub git_email: Option<String>,
}

/// A monorepo project entry: `path` and `paths` are interchangeable, the
/// way most users write single-directory projects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectEntry {
    name: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    paths: Vec<String>,
}

/// The shape of `.semrel.yaml` / `.semrel.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    branches: Vec<Branch>,
    #[serde(default)]
    rules: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    monorepo: Vec<ProjectEntry>,
    tag_prefix: Option<String>,
    build_metadata: Option<String>,
    gpg_key_path: Option<PathBuf>,
    lightweight_tags: Option<bool>,
    dry_run: Option<bool>,
    remote_name: Option<String>,
    access_token: Option<String>,
    git_name: Option<String>,
    git_email: Option<String>,
}

/// Parses file contents by extension: `.json` is JSON, everything else YAML
/// (YAML is a superset of JSON, so bare `.semrel` files still load).
fn parse_file(path: &Path, contents: &str) -> anyhow::Result<FileConfig> {
    let config = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(contents)
            .with_context(|| format!("invalid JSON configuration in {}", path.display()))?
    } else {
        serde_yaml::from_str(contents)
            .with_context(|| format!("invalid YAML configuration in {}", path.display()))?
    };
    Ok(config)
}

/// Loads the configuration file: the explicit `--config` path, or the first
/// `.semrel.{yaml,yml,json}` found in the repository directory.
fn load_file(args: &ReleaseArgs) -> anyhow::Result<FileConfig> {
    if let Some(path) = &args.config {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file {}", path.display()))?;
        return parse_file(path, &contents);
    }

    // Discovery only applies to local repositories; a URL run has no
    // checkout yet when configuration is resolved.
    if args.url.is_none() {
        for name in [".semrel.yaml", ".semrel.yml", ".semrel.json"] {
            let candidate = Path::new(&args.path).join(name);
            if candidate.is_file() {
                let contents = fs::read_to_string(&candidate).with_context(|| {
                    format!("cannot read configuration file {}", candidate.display())
                })?;
                return parse_file(&candidate, &contents);
            }
        }
    }

    Ok(FileConfig::default())
}

/// Resolves the run configuration from flags and the configuration file.
///
/// # Errors
///
/// Fails on unreadable or invalid configuration files, invalid release
/// rules, and monorepo entries mixing `path` with `paths`.
pub fn resolve(args: &ReleaseArgs) -> anyhow::Result<RunConfig> {
    let file = load_file(args)?;

    let repository = match &args.url {
        Some(url) => RepoSource::Url(url.clone()),
        None => RepoSource::Path(args.path.clone()),
    };

    let branches = if file.branches.is_empty() {
        vec![Branch::stable("main")]
    } else {
        file.branches
    };

    let rules = match &file.rules {
        Some(mapping) => ReleaseRules::from_map(mapping)?,
        None => ReleaseRules::default(),
    };

    let mut projects = Vec::with_capacity(file.monorepo.len());
    for entry in &file.monorepo {
        if entry.path.is_some() && !entry.paths.is_empty() {
            bail!("monorepo project `{}` sets both `path` and `paths`", entry.name);
        }
        let paths = match &entry.path {
            Some(path) => vec![path.clone()],
            None => entry.paths.clone(),
        };
        projects.push(Project::new(&entry.name, &paths));
    }

    Ok(RunConfig {
        repository,
        branches,
        rules,
        projects,
        tag_prefix: args
            .tag_prefix
            .clone()
            .or(file.tag_prefix)
            .unwrap_or_else(|| "v".to_string()),
        build_metadata: args.build_metadata.clone().or(file.build_metadata),
        gpg_key_path: args.gpg_key_path.clone().or(file.gpg_key_path),
        lightweight_tags: args.lightweight_tags || file.lightweight_tags.unwrap_or(false),
        dry_run: args.dry_run || file.dry_run.unwrap_or(false),
        remote_name: args.remote_name.clone().or(file.remote_name),
        access_token: args
            .access_token
            .clone()
            .or_else(|| std::env::var("SEMREL_ACCESS_TOKEN").ok())
            .or(file.access_token),
        git_name: args.git_name.clone().or(file.git_name),
        git_email: args.git_email.clone().or(file.git_email),
    })
}
