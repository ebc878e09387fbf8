// src/cli.rs
//! CLI definitions for apkdex
//!
//! The command implementations live in the `commands` module.

use apkdex::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apkdex")]
#[command(version)]
#[command(about = "Index apk repositories into per-branch SQLite databases", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync branches with their remote indexes
    Sync {
        /// Branch to sync (repeatable; default: all configured branches)
        #[arg(short, long)]
        branch: Vec<String>,

        /// Architectures to sync instead of the configured ones
        arches: Vec<String>,
    },

    /// Show one package with its dependencies, provides and files
    Show {
        /// Branch to read (default: the configured default branch)
        #[arg(short, long)]
        branch: Option<String>,

        repo: String,
        arch: String,
        name: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the plain-text index of a repository, rendering it if needed
    Index {
        #[arg(short, long)]
        branch: Option<String>,

        repo: String,
        arch: String,
    },

    /// List maintainers and how many packages each one has
    Maintainers {
        #[arg(short, long)]
        branch: Option<String>,
    },
}
