//! `semrel` — automated semantic-version releases from conventional commits.

use clap::Parser;

mod cli;
mod commands;
mod config;
mod output;
mod signer;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Cli::parse();
    match args.command {
        cli::Command::Release(release) => commands::release::run(&release),
    }
}
