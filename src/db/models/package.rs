// src/db/models/package.rs

//! Package model - one row per (repo, arch, name, version)

use crate::error::Result;
use crate::index::{PackageKey, PackageMeta};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;
use std::collections::BTreeSet;

const COLUMNS: &str = "id, repo, arch, name, version, description, url, license, unique_id, \
                       size, installed_size, origin, maintainer_id, build_time, commit_id, \
                       provider_priority";

/// Column list qualified with a table alias, for joins
fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A stored package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    pub id: Option<i64>,
    pub repo: String,
    pub arch: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub url: String,
    pub license: String,
    pub unique_id: String,
    pub size: Option<i64>,
    pub installed_size: Option<i64>,
    pub origin: String,
    pub maintainer_id: Option<i64>,
    pub build_time: Option<i64>,
    pub commit: String,
    pub provider_priority: Option<i64>,
}

/// Sort order of package listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackageOrder {
    /// Newest build first; packages without a build time come last
    #[default]
    RecentBuilds,
    /// Alphabetical by name
    Name,
}

impl PackageOrder {
    fn order_by(self) -> &'static str {
        match self {
            PackageOrder::RecentBuilds => "p.build_time DESC, p.name, p.repo, p.arch",
            PackageOrder::Name => "p.name, p.repo, p.arch",
        }
    }
}

/// Exact-match filter for package listings
///
/// Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    pub repo: Option<String>,
    pub arch: Option<String>,
    pub name: Option<String>,
    pub origin: Option<String>,
    pub maintainer_name: Option<String>,
    pub maintainer_email: Option<String>,
    /// Only packages that are their own origin (no subpackages)
    pub origin_only: bool,
    pub order: PackageOrder,
}

impl PackageFilter {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        for (column, value) in [
            ("p.repo", &self.repo),
            ("p.arch", &self.arch),
            ("p.name", &self.name),
            ("p.origin", &self.origin),
            ("m.name", &self.maintainer_name),
            ("m.email", &self.maintainer_email),
        ] {
            if let Some(value) = value {
                values.push(Value::Text(value.clone()));
                clauses.push(format!("{column} = ?{}", values.len()));
            }
        }
        if self.origin_only {
            clauses.push("p.origin = p.name".to_string());
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

impl Package {
    /// Build a row from an extracted record
    pub fn from_meta(
        meta: &PackageMeta,
        repo: &str,
        arch: &str,
        maintainer_id: Option<i64>,
    ) -> Self {
        Self {
            id: None,
            repo: repo.to_string(),
            arch: arch.to_string(),
            name: meta.name.clone(),
            version: meta.version.clone(),
            description: meta.description.clone(),
            url: meta.url.clone(),
            license: meta.license.clone(),
            unique_id: meta.unique_id.clone(),
            size: meta.size,
            installed_size: meta.installed_size,
            origin: meta.origin.clone(),
            maintainer_id,
            build_time: meta.build_time,
            commit: meta.commit.clone(),
            provider_priority: meta.provider_priority,
        }
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(&self.repo, &self.arch, &self.name, &self.version)
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO packages (repo, arch, name, version, description, url, license,
                                   unique_id, size, installed_size, origin, maintainer_id,
                                   build_time, commit_id, provider_priority)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                &self.repo,
                &self.arch,
                &self.name,
                &self.version,
                &self.description,
                &self.url,
                &self.license,
                &self.unique_id,
                &self.size,
                &self.installed_size,
                &self.origin,
                &self.maintainer_id,
                &self.build_time,
                &self.commit,
                &self.provider_priority,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a package by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM packages WHERE id = ?1"))?;
        let package = stmt.query_row([id], Self::from_row).optional()?;
        Ok(package)
    }

    /// Find a package by its natural key
    pub fn find_by_key(conn: &Connection, key: &PackageKey) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages
             WHERE repo = ?1 AND arch = ?2 AND name = ?3 AND version = ?4"
        ))?;
        let package = stmt
            .query_row(
                params![&key.repo, &key.arch, &key.name, &key.version],
                Self::from_row,
            )
            .optional()?;
        Ok(package)
    }

    /// Find a package by name in one repository
    ///
    /// An index carries one version per name; if several were stored the
    /// most recently inserted one is returned.
    pub fn find_by_name(
        conn: &Connection,
        repo: &str,
        arch: &str,
        name: &str,
    ) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages
             WHERE repo = ?1 AND arch = ?2 AND name = ?3
             ORDER BY id DESC LIMIT 1"
        ))?;
        let package = stmt
            .query_row(params![repo, arch, name], Self::from_row)
            .optional()?;
        Ok(package)
    }

    /// Find every package with this name for an architecture, across repositories
    pub fn find_all_by_name(conn: &Connection, name: &str, arch: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages
             WHERE name = ?1 AND arch = ?2
             ORDER BY repo, id"
        ))?;
        let packages = stmt
            .query_map(params![name, arch], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Find packages built from the given origin
    pub fn find_by_origin(conn: &Connection, origin: &str, arch: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages
             WHERE origin = ?1 AND arch = ?2
             ORDER BY name, repo"
        ))?;
        let packages = stmt
            .query_map(params![origin, arch], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Packages of `arch` depending on `name` or on anything package `id` provides
    pub fn find_dependents(
        conn: &Connection,
        id: i64,
        name: &str,
        arch: &str,
    ) -> Result<Vec<Self>> {
        let columns = prefixed_columns("p");
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {columns} FROM depends d
             JOIN packages p ON p.id = d.package_id
             WHERE p.arch = ?3
               AND (d.name = ?2 OR d.name IN (SELECT name FROM provides WHERE package_id = ?1))
             ORDER BY p.name, p.repo"
        ))?;
        let packages = stmt
            .query_map(params![id, name, arch], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Natural keys currently stored for one repository/architecture pair
    pub fn keys_for(conn: &Connection, repo: &str, arch: &str) -> Result<BTreeSet<PackageKey>> {
        let mut stmt = conn.prepare(
            "SELECT repo, arch, name, version FROM packages WHERE repo = ?1 AND arch = ?2",
        )?;
        let keys = stmt
            .query_map(params![repo, arch], |row| {
                Ok(PackageKey {
                    repo: row.get(0)?,
                    arch: row.get(1)?,
                    name: row.get(2)?,
                    version: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(keys)
    }

    /// List packages matching a filter in the filter's order
    pub fn list(
        conn: &Connection,
        filter: &PackageFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let (where_clause, mut values) = filter.where_clause();
        let columns = prefixed_columns("p");

        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));
        let sql = format!(
            "SELECT {columns} FROM packages p
             LEFT JOIN maintainers m ON m.id = p.maintainer_id
             {where_clause}
             ORDER BY {}
             LIMIT ?{} OFFSET ?{}",
            filter.order.order_by(),
            values.len() - 1,
            values.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let packages = stmt
            .query_map(params_from_iter(values.iter()), Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Count packages matching a filter
    pub fn count(conn: &Connection, filter: &PackageFilter) -> Result<i64> {
        let (where_clause, values) = filter.where_clause();
        let sql = format!(
            "SELECT COUNT(*) FROM packages p
             LEFT JOIN maintainers m ON m.id = p.maintainer_id
             {where_clause}"
        );
        let count = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count)
    }

    /// Delete the package with this natural key; children cascade
    ///
    /// Returns the number of rows removed.
    pub fn delete_by_key(conn: &Connection, key: &PackageKey) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM packages WHERE repo = ?1 AND arch = ?2 AND name = ?3 AND version = ?4",
            params![&key.repo, &key.arch, &key.name, &key.version],
        )?;
        Ok(deleted)
    }

    /// Convert a database row to a Package
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            repo: row.get(1)?,
            arch: row.get(2)?,
            name: row.get(3)?,
            version: row.get(4)?,
            description: row.get(5)?,
            url: row.get(6)?,
            license: row.get(7)?,
            unique_id: row.get(8)?,
            size: row.get(9)?,
            installed_size: row.get(10)?,
            origin: row.get(11)?,
            maintainer_id: row.get(12)?,
            build_time: row.get(13)?,
            commit: row.get(14)?,
            provider_priority: row.get(15)?,
        })
    }
}
