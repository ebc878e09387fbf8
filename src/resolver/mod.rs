// src/resolver/mod.rs

//! Dependency name resolution
//!
//! A dependency name resolves to a package of the same architecture in
//! two steps:
//!
//! 1. A package whose own name matches always wins.
//! 2. Otherwise every package providing the name is a candidate and the
//!    best one is picked by provided version, then provider priority.
//!
//! Operators and versions on the dependency itself are informational and
//! do not constrain the result. A name nothing provides stays unresolved.

mod provider;

pub use provider::{
    DEFAULT_PROVIDER_PRIORITY, ProviderCandidate, compare_candidates, select_provider,
};

use crate::db::models::{Package, RelationEntry, RelationKind};
use crate::error::Result;
use crate::version::{ApkVersionOrder, VersionCompare};
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::debug;

/// Package a dependency resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub name: String,
    pub repo: String,
    pub arch: String,
}

/// Outcome for one dependency name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resolution {
    Resolved { name: String, target: ResolvedTarget },
    Unresolved { name: String },
}

impl Resolution {
    pub fn name(&self) -> &str {
        match self {
            Resolution::Resolved { name, .. } | Resolution::Unresolved { name } => name,
        }
    }

    pub fn target(&self) -> Option<&ResolvedTarget> {
        match self {
            Resolution::Resolved { target, .. } => Some(target),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Resolves dependency names against one branch database
pub struct DependencyResolver<'a, V = ApkVersionOrder> {
    conn: &'a Connection,
    order: V,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self::with_order(conn, ApkVersionOrder)
    }
}

impl<'a, V: VersionCompare> DependencyResolver<'a, V> {
    pub fn with_order(conn: &'a Connection, order: V) -> Self {
        Self { conn, order }
    }

    /// Resolve a single dependency name for an architecture
    pub fn resolve(&self, name: &str, arch: &str) -> Result<Resolution> {
        // Direct matches are never overridden by providers
        let direct = Package::find_all_by_name(self.conn, name, arch)?;
        if let Some(package) = direct.into_iter().next() {
            return Ok(Resolution::Resolved {
                name: name.to_string(),
                target: ResolvedTarget {
                    name: package.name,
                    repo: package.repo,
                    arch: package.arch,
                },
            });
        }

        let candidates = self.provider_candidates(name, arch)?;
        let resolution = match select_provider(&candidates, &self.order) {
            Some(best) => Resolution::Resolved {
                name: name.to_string(),
                target: ResolvedTarget {
                    name: best.name.clone(),
                    repo: best.repo.clone(),
                    arch: best.arch.clone(),
                },
            },
            None => {
                debug!("Dependency {} ({}) is not provided by anything", name, arch);
                Resolution::Unresolved {
                    name: name.to_string(),
                }
            }
        };

        Ok(resolution)
    }

    /// Resolve every dependency of a package, in declaration order
    pub fn resolve_package(&self, package_id: i64, arch: &str) -> Result<Vec<Resolution>> {
        RelationEntry::find_by_package(self.conn, RelationKind::Depends, package_id)?
            .iter()
            .map(|dep| self.resolve(&dep.name, arch))
            .collect()
    }

    /// Packages of `arch` providing `name`, in package id order
    pub fn provider_candidates(&self, name: &str, arch: &str) -> Result<Vec<ProviderCandidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.repo, p.arch, pr.version, p.provider_priority
             FROM provides pr
             JOIN packages p ON p.id = pr.package_id
             WHERE pr.name = ?1 AND p.arch = ?2
             ORDER BY p.id, pr.id",
        )?;

        let candidates = stmt
            .query_map(params![name, arch], |row| {
                Ok(ProviderCandidate {
                    package_id: row.get(0)?,
                    name: row.get(1)?,
                    repo: row.get(2)?,
                    arch: row.get(3)?,
                    provided_version: row.get(4)?,
                    provider_priority: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(candidates)
    }
}
