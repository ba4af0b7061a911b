//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Automated semantic versioning for Git repositories.
#[derive(Debug, Parser)]
#[command(name = "semrel", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze commit history and tag the next semantic version
    Release(ReleaseArgs),
}

/// Arguments of `semrel release`.
///
/// Every flag overrides the corresponding configuration-file key; flags left
/// unset fall back to the file, then to built-in defaults.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Path to the repository to analyze
    #[arg(default_value = ".", conflicts_with = "url")]
    pub path: String,

    /// Remote repository URL; cloned into a scoped temporary directory
    #[arg(long)]
    pub url: Option<String>,

    /// Configuration file (YAML or JSON); defaults to `.semrel.yaml` in the
    /// repository when present
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Prefix stripped from and applied to version tags (e.g. `v`)
    #[arg(long)]
    pub tag_prefix: Option<String>,

    /// Build metadata appended to released versions
    #[arg(long)]
    pub build_metadata: Option<String>,

    /// Armored GPG key used to sign annotated tags
    #[arg(long)]
    pub gpg_key_path: Option<PathBuf>,

    /// Write lightweight tags instead of annotated ones
    #[arg(long)]
    pub lightweight_tags: bool,

    /// Compute and report decisions without writing or pushing tags
    #[arg(long)]
    pub dry_run: bool,

    /// Remote to push created tags to; no push happens when unset
    #[arg(long)]
    pub remote_name: Option<String>,

    /// Access token for HTTPS clone and push authentication
    #[arg(long)]
    pub access_token: Option<String>,

    /// Committer name used for annotated tags
    #[arg(long)]
    pub git_name: Option<String>,

    /// Committer email used for annotated tags
    #[arg(long)]
    pub git_email: Option<String>,
}
