// src/query.rs

//! Read-only accessors for serving a branch database
//!
//! Everything here only reads committed state; callers own pagination and
//! presentation.

use crate::db::models::{FileEntry, Maintainer, Package, RelationEntry, RelationKind};
use crate::error::{Error, Result};
use crate::index::PackageKey;
use crate::resolver::{DependencyResolver, Resolution};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use serde::Serialize;

pub use crate::db::models::{ContentEntry, ContentsFilter, PackageFilter, PackageOrder};

/// Everything shown on a package page
#[derive(Debug, Clone, Serialize)]
pub struct PackageDetails {
    pub package: Package,
    pub maintainer: Option<Maintainer>,
    /// `build_time` rendered as UTC
    pub build_date: Option<String>,
    pub depends: Vec<Resolution>,
    pub provides: Vec<RelationEntry>,
    pub install_if: Vec<RelationEntry>,
    pub required_by: Vec<Package>,
    pub subpackages: Vec<Package>,
    pub files: Vec<String>,
}

pub fn find_package(
    conn: &Connection,
    repo: &str,
    arch: &str,
    name: &str,
) -> Result<Option<Package>> {
    Package::find_by_name(conn, repo, arch, name)
}

pub fn find_by_key(conn: &Connection, key: &PackageKey) -> Result<Option<Package>> {
    Package::find_by_key(conn, key)
}

pub fn list_packages(
    conn: &Connection,
    filter: &PackageFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Package>> {
    Package::list(conn, filter, limit, offset)
}

pub fn count_packages(conn: &Connection, filter: &PackageFilter) -> Result<i64> {
    Package::count(conn, filter)
}

/// Files across packages matching a filter, ordered by directory then name
pub fn contents(
    conn: &Connection,
    filter: &ContentsFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<ContentEntry>> {
    FileEntry::search(conn, filter, limit, offset)
}

pub fn count_contents(conn: &Connection, filter: &ContentsFilter) -> Result<i64> {
    FileEntry::count_matching(conn, filter)
}

/// Absolute paths of a package's files
pub fn files(conn: &Connection, package_id: i64) -> Result<Vec<String>> {
    Ok(FileEntry::find_by_package(conn, package_id)?
        .iter()
        .map(FileEntry::full_path)
        .collect())
}

/// Packages depending on this package by name or through one of its provides
pub fn required_by(
    conn: &Connection,
    package_id: i64,
    name: &str,
    arch: &str,
) -> Result<Vec<Package>> {
    Package::find_dependents(conn, package_id, name, arch)
}

/// Packages built from the same origin
pub fn subpackages(conn: &Connection, origin: &str, arch: &str) -> Result<Vec<Package>> {
    Package::find_by_origin(conn, origin, arch)
}

pub fn install_if(conn: &Connection, package_id: i64) -> Result<Vec<RelationEntry>> {
    RelationEntry::find_by_package(conn, RelationKind::InstallIf, package_id)
}

/// Provides of a package, leaving out its own name
pub fn provides(conn: &Connection, package_id: i64, name: &str) -> Result<Vec<RelationEntry>> {
    Ok(RelationEntry::find_by_package(conn, RelationKind::Provides, package_id)?
        .into_iter()
        .filter(|entry| entry.name != name)
        .collect())
}

/// Every maintainer with its package count
pub fn maintainers(conn: &Connection) -> Result<Vec<(Maintainer, i64)>> {
    Maintainer::list_with_counts(conn)
}

/// Gather all details of one package
pub fn package_details(
    conn: &Connection,
    repo: &str,
    arch: &str,
    name: &str,
) -> Result<PackageDetails> {
    let package = find_package(conn, repo, arch, name)?
        .ok_or_else(|| Error::NotFoundError(format!("{repo}/{arch}/{name}")))?;
    let id = package
        .id
        .ok_or_else(|| Error::NotFoundError(format!("{repo}/{arch}/{name} has no id")))?;

    let maintainer = match package.maintainer_id {
        Some(maintainer_id) => Maintainer::find_by_id(conn, maintainer_id)?,
        None => None,
    };
    let build_date = package
        .build_time
        .and_then(|t| Utc.timestamp_opt(t, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string());

    Ok(PackageDetails {
        maintainer,
        build_date,
        depends: DependencyResolver::new(conn).resolve_package(id, arch)?,
        provides: provides(conn, id, &package.name)?,
        install_if: install_if(conn, id)?,
        required_by: required_by(conn, id, &package.name, arch)?,
        subpackages: subpackages(conn, &package.origin, arch)?,
        files: files(conn, id)?,
        package,
    })
}
