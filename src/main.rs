// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = apkdex::Config::load(&cli.config)?;

    match cli.command {
        Commands::Sync { branch, arches } => commands::cmd_sync(&config, &branch, &arches),
        Commands::Show {
            branch,
            repo,
            arch,
            name,
            json,
        } => commands::cmd_show(&config, branch.as_deref(), &repo, &arch, &name, json),
        Commands::Index { branch, repo, arch } => {
            commands::cmd_index(&config, branch.as_deref(), &repo, &arch)
        }
        Commands::Maintainers { branch } => commands::cmd_maintainers(&config, branch.as_deref()),
    }
}
