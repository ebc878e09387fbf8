// src/sync/ingest.rs

//! Branch ingestion
//!
//! A branch sync runs in two phases. Preparation fetches, decodes and
//! deduplicates every (repo, arch) pair in parallel; a pair that fails here
//! is skipped and keeps its stored state. The apply phase then takes one
//! `BEGIN IMMEDIATE` transaction, reads the stored keys of each pair under
//! that lock, diffs and writes. Readers see either the whole run or none
//! of it, and rows committed by another writer during preparation are
//! never inserted twice.

use super::diff::PackageDiff;
use super::fetch::Fetcher;
use crate::cache::IndexCache;
use crate::config::Config;
use crate::db;
use crate::db::models::{FileEntry, Maintainer, Package, RelationEntry, RelationKind};
use crate::dump::{self, IndexDumper};
use crate::error::Result;
use crate::index::{self, PackageKey, PackageMeta, parse_maintainer};
use rayon::prelude::*;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// What happened to one repository/architecture pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    Synced { added: usize, removed: usize },
    /// Fetch or decode failed; stored state was left untouched
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairReport {
    pub repo: String,
    pub arch: String,
    pub outcome: PairOutcome,
}

/// Summary of one branch sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub branch: String,
    pub pairs: Vec<PairReport>,
    pub pruned_maintainers: usize,
}

impl SyncReport {
    pub fn added(&self) -> usize {
        self.synced().map(|(added, _)| added).sum()
    }

    pub fn removed(&self) -> usize {
        self.synced().map(|(_, removed)| removed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p.outcome, PairOutcome::Skipped { .. }))
            .count()
    }

    fn synced(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().filter_map(|p| match p.outcome {
            PairOutcome::Synced { added, removed } => Some((added, removed)),
            PairOutcome::Skipped { .. } => None,
        })
    }
}

/// Remote state of one pair, fetched and decoded before any write
struct PairFetch {
    repo: String,
    arch: String,
    /// Deduplicated remote records by natural key
    remote: BTreeMap<PackageKey, PackageMeta>,
}

/// The ingestion pipeline
pub struct Ingestor {
    config: Config,
    fetcher: Box<dyn Fetcher>,
    dumper: Box<dyn IndexDumper>,
    cache: IndexCache,
}

impl Ingestor {
    pub fn new(config: Config, fetcher: Box<dyn Fetcher>, dumper: Box<dyn IndexDumper>) -> Self {
        let cache = IndexCache::new(config.settings.index_cache.clone());
        Self {
            config,
            fetcher,
            dumper,
            cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sync every configured branch in order
    ///
    /// A failing branch is logged and does not stop the ones after it.
    pub fn sync_all(&self, arch_override: &[String]) -> Vec<(String, Result<SyncReport>)> {
        self.config
            .repository
            .branches
            .iter()
            .map(|branch| {
                let result = self.sync_branch(branch, arch_override);
                if let Err(e) = &result {
                    warn!("Sync of branch {} failed: {}", branch, e);
                }
                (branch.clone(), result)
            })
            .collect()
    }

    /// Sync one branch
    ///
    /// `arch_override`, when non-empty, replaces the configured arches.
    pub fn sync_branch(&self, branch: &str, arch_override: &[String]) -> Result<SyncReport> {
        let arches = if arch_override.is_empty() {
            self.config.repository.arches.as_slice()
        } else {
            arch_override
        };
        let db_path = self.config.branch_db_path(branch);
        db::init(&db_path)?;

        info!(
            "Syncing branch {} ({} repos, {} arches)",
            branch,
            self.config.repository.repos.len(),
            arches.len()
        );

        let pairs: Vec<(&str, &str)> = self
            .config
            .repository
            .repos
            .iter()
            .flat_map(|repo| arches.iter().map(move |arch| (repo.as_str(), arch.as_str())))
            .collect();

        let prepared: Vec<(String, String, Result<PairFetch>)> = pairs
            .par_iter()
            .map(|(repo, arch)| {
                let fetched = self.prepare_pair(&db_path, branch, repo, arch);
                (repo.to_string(), arch.to_string(), fetched)
            })
            .collect();

        let mut fetched = Vec::new();
        let mut pair_reports = Vec::new();
        for (repo, arch, result) in prepared {
            match result {
                Ok(pair) => fetched.push(pair),
                Err(e) => {
                    warn!("Skipping {}/{}/{}: {}", branch, repo, arch, e);
                    pair_reports.push(PairReport {
                        repo,
                        arch,
                        outcome: PairOutcome::Skipped {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        let mut conn = self.open(&db_path)?;
        let (applied, pruned_maintainers) = db::immediate_transaction(
            &mut conn,
            self.config.database.lock_retries,
            self.config.lock_retry_delay(),
            |tx| {
                let applied = fetched
                    .iter()
                    .map(|pair| apply_pair(tx, pair))
                    .collect::<Result<Vec<_>>>()?;
                let pruned = Maintainer::prune_orphans(tx)?;
                Ok((applied, pruned))
            },
        )?;

        for (pair, (added, removed)) in fetched.iter().zip(applied) {
            if let Err(e) = self.cache.invalidate(branch, &pair.repo, &pair.arch) {
                warn!(
                    "Failed to invalidate cached index for {}/{}: {}",
                    pair.repo, pair.arch, e
                );
            }
            pair_reports.push(PairReport {
                repo: pair.repo.clone(),
                arch: pair.arch.clone(),
                outcome: PairOutcome::Synced { added, removed },
            });
        }
        pair_reports.sort_by(|a, b| (&a.repo, &a.arch).cmp(&(&b.repo, &b.arch)));

        let report = SyncReport {
            branch: branch.to_string(),
            pairs: pair_reports,
            pruned_maintainers,
        };
        info!(
            "Branch {}: {} added, {} removed, {} pairs skipped, {} maintainers pruned",
            branch,
            report.added(),
            report.removed(),
            report.skipped(),
            report.pruned_maintainers
        );

        Ok(report)
    }

    fn open(&self, db_path: &Path) -> Result<Connection> {
        db::open_with_timeout(db_path, self.config.busy_timeout())
    }

    /// Fetch and decode one pair without writing anything
    ///
    /// Archive file lists are fetched for packages not stored yet. The
    /// stored keys read here only pick those candidates; the diff itself is
    /// computed again under the write lock.
    fn prepare_pair(
        &self,
        db_path: &Path,
        branch: &str,
        repo: &str,
        arch: &str,
    ) -> Result<PairFetch> {
        let url = self.config.index_url(branch, repo, arch);
        let raw = self.fetcher.fetch(&url).into_bytes(&url)?;
        let tree = dump::decode_blob(self.dumper.as_ref(), &raw)?;
        let mut remote = index::index_by_key(index::extract_packages(&tree), repo, arch);

        debug!("{}/{}/{}: {} remote packages", branch, repo, arch, remote.len());

        if self.config.settings.fetch_files {
            let conn = self.open(db_path)?;
            let stored = Package::keys_for(&conn, repo, arch)?;
            drop(conn);

            for (key, meta) in remote.iter_mut() {
                if meta.files.is_none() && !stored.contains(key) {
                    meta.files = Some(self.archive_files(branch, repo, arch, meta));
                }
            }
        }

        Ok(PairFetch {
            repo: repo.to_string(),
            arch: arch.to_string(),
            remote,
        })
    }

    /// File list of a package read from its archive; empty if unavailable
    fn archive_files(
        &self,
        branch: &str,
        repo: &str,
        arch: &str,
        meta: &PackageMeta,
    ) -> Vec<String> {
        let url = self
            .config
            .archive_url(branch, repo, arch, &meta.name, &meta.version);
        match self.fetcher.fetch(&url).into_bytes(&url) {
            Ok(raw) => index::paths_from_archive(self.dumper.as_ref(), &raw),
            Err(e) => {
                warn!("No file list for {}-{}: {}", meta.name, meta.version, e);
                Vec::new()
            }
        }
    }
}

/// Diff one pair against the keys stored under the current transaction and
/// write it; returns (added, removed)
fn apply_pair(conn: &Connection, pair: &PairFetch) -> Result<(usize, usize)> {
    let stored = Package::keys_for(conn, &pair.repo, &pair.arch)?;
    let remote_keys: BTreeSet<PackageKey> = pair.remote.keys().cloned().collect();
    let diff = PackageDiff::compute(&stored, &remote_keys);

    let mut removed = 0;
    for key in &diff.to_remove {
        match Package::delete_by_key(conn, key)? {
            0 => warn!("Package {} in {}/{} was already gone", key, key.repo, key.arch),
            n => removed += n,
        }
    }

    let mut added = 0;
    for key in &diff.to_add {
        if let Some(meta) = pair.remote.get(key) {
            insert_package(conn, &pair.repo, &pair.arch, meta)?;
            added += 1;
        }
    }

    if !diff.is_empty() {
        info!(
            "{}/{}: added {}, removed {}",
            pair.repo, pair.arch, added, removed
        );
    }

    Ok((added, removed))
}

/// Insert a package with its maintainer, relations and files
pub fn insert_package(
    conn: &Connection,
    repo: &str,
    arch: &str,
    meta: &PackageMeta,
) -> Result<i64> {
    let maintainer_id = match meta.maintainer.as_deref().and_then(parse_maintainer) {
        Some((name, email)) => Some(Maintainer::new(name, email).upsert(conn)?),
        None => None,
    };

    let mut package = Package::from_meta(meta, repo, arch, maintainer_id);
    let package_id = package.insert(conn)?;

    for (kind, specs) in [
        (RelationKind::Provides, &meta.provides),
        (RelationKind::Depends, &meta.depends),
        (RelationKind::InstallIf, &meta.install_if),
    ] {
        for spec in specs {
            RelationEntry::new(package_id, spec).insert(conn, kind)?;
        }
    }

    for path in meta.files.iter().flatten() {
        FileEntry::new(package_id, path).insert(conn)?;
    }

    Ok(package_id)
}
