// src/commands.rs
//! Command handlers for the apkdex CLI

use anyhow::{Context, Result, anyhow, bail};
use apkdex::dump::ApkTool;
use apkdex::query::{self, PackageDetails};
use apkdex::resolver::Resolution;
use apkdex::sync::{Ingestor, PairOutcome, RepositoryFetcher, SyncReport};
use apkdex::{Config, IndexCache};
use rusqlite::Connection;
use std::fs::File;
use std::io;
use tracing::info;

/// Resolve the branch argument and open its database
fn open_branch(config: &Config, branch: Option<&str>) -> Result<(String, Connection)> {
    let branch = branch.unwrap_or_else(|| config.default_branch()).to_string();
    if !config.repository.branches.contains(&branch) {
        bail!("Unknown branch '{}'", branch);
    }

    let path = config.branch_db_path(&branch);
    if !path.exists() {
        bail!("Branch '{}' has not been synced yet ({})", branch, path.display());
    }

    let conn = apkdex::db::open_with_timeout(&path, config.busy_timeout())?;
    Ok((branch, conn))
}

fn print_report(report: &SyncReport) {
    println!("Branch {}:", report.branch);
    for pair in &report.pairs {
        match &pair.outcome {
            PairOutcome::Synced { added, removed } => println!(
                "  [OK] {}/{}: {} added, {} removed",
                pair.repo, pair.arch, added, removed
            ),
            PairOutcome::Skipped { reason } => {
                println!("  [SKIPPED] {}/{}: {}", pair.repo, pair.arch, reason)
            }
        }
    }
    if report.pruned_maintainers > 0 {
        println!("  Pruned {} unused maintainers", report.pruned_maintainers);
    }
}

/// Sync the given branches, or all of them
pub fn cmd_sync(config: &Config, branches: &[String], arches: &[String]) -> Result<()> {
    for branch in branches {
        if !config.repository.branches.contains(branch) {
            bail!("Unknown branch '{}'", branch);
        }
    }

    let fetcher = RepositoryFetcher::new()?;
    let dumper = ApkTool::new(config.settings.apk.clone()).with_timeout(config.apk_timeout());
    let ingestor = Ingestor::new(config.clone(), Box::new(fetcher), Box::new(dumper));

    let results = if branches.is_empty() {
        ingestor.sync_all(arches)
    } else {
        branches
            .iter()
            .map(|branch| (branch.clone(), ingestor.sync_branch(branch, arches)))
            .collect()
    };

    let mut failed = Vec::new();
    for (branch, result) in results {
        match result {
            Ok(report) => print_report(&report),
            Err(e) => {
                println!("Branch {}: [FAILED] {}", branch, e);
                failed.push(branch);
            }
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!("Sync failed for: {}", failed.join(", ")));
    }
    Ok(())
}

fn print_details(details: &PackageDetails) {
    let pkg = &details.package;
    println!("{} {} ({}/{})", pkg.name, pkg.version, pkg.repo, pkg.arch);
    println!("  Description: {}", pkg.description);
    println!("  URL: {}", pkg.url);
    println!("  License: {}", pkg.license);
    println!("  Origin: {}", pkg.origin);
    if let Some(m) = &details.maintainer {
        println!("  Maintainer: {} <{}>", m.name, m.email);
    }
    if let Some(date) = &details.build_date {
        println!("  Build date: {}", date);
    }
    println!("  Commit: {}", pkg.commit);

    println!("\nDepends ({}):", details.depends.len());
    for dep in &details.depends {
        match dep {
            Resolution::Resolved { name, target } => {
                println!("  {} -> {} ({})", name, target.name, target.repo)
            }
            Resolution::Unresolved { name } => println!("  {} (unresolved)", name),
        }
    }

    println!("\nProvides ({}):", details.provides.len());
    for entry in &details.provides {
        println!("  {}", entry.spec());
    }

    if !details.install_if.is_empty() {
        println!("\nInstall if ({}):", details.install_if.len());
        for entry in &details.install_if {
            println!("  {}", entry.spec());
        }
    }

    println!("\nRequired by ({}):", details.required_by.len());
    for pkg in &details.required_by {
        println!("  {} ({})", pkg.name, pkg.repo);
    }

    println!("\nSubpackages ({}):", details.subpackages.len());
    for pkg in &details.subpackages {
        println!("  {}", pkg.name);
    }

    println!("\nFiles ({}):", details.files.len());
    for file in &details.files {
        println!("  {}", file);
    }
}

/// Show one package
pub fn cmd_show(
    config: &Config,
    branch: Option<&str>,
    repo: &str,
    arch: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let (_, conn) = open_branch(config, branch)?;
    let details = query::package_details(&conn, repo, arch, name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        print_details(&details);
    }
    Ok(())
}

/// Print a rendered plain-text index
pub fn cmd_index(config: &Config, branch: Option<&str>, repo: &str, arch: &str) -> Result<()> {
    let (branch, conn) = open_branch(config, branch)?;
    let cache = IndexCache::new(config.settings.index_cache.clone());

    let path = cache.render(&conn, &branch, repo, arch)?;
    info!("Serving index from {}", path.display());

    let mut file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    io::copy(&mut file, &mut io::stdout().lock())?;
    Ok(())
}

/// List maintainers of a branch
pub fn cmd_maintainers(config: &Config, branch: Option<&str>) -> Result<()> {
    let (_, conn) = open_branch(config, branch)?;
    let maintainers = query::maintainers(&conn)?;

    if maintainers.is_empty() {
        println!("No maintainers recorded");
        return Ok(());
    }

    for (maintainer, count) in maintainers {
        println!("{} <{}> ({} packages)", maintainer.name, maintainer.email, count);
    }
    Ok(())
}
