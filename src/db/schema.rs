// src/db/schema.rs

//! Database schema definitions and migrations
//!
//! Each branch lives in its own SQLite file with the same layout: a
//! packages table, four child tables that cascade on package deletion and
//! a shared maintainers table.

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
///
/// Checked first so that opening an up-to-date database never writes.
fn init_schema_version(conn: &Connection) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master
                       WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(());
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    info!(
        "Schema migration complete. Now at version {}",
        SCHEMA_VERSION
    );
    Ok(())
}

/// Apply a specific migration version
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::InitError(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Initial schema - Version 1
///
/// - maintainers: shared (name, email) identities
/// - packages: one row per (repo, arch, name, version)
/// - files, provides, depends, install_if: per-package children
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE maintainers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            UNIQUE(name, email)
        );

        CREATE TABLE packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repo TEXT NOT NULL,
            arch TEXT NOT NULL,
            name TEXT NOT NULL,
            version TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT '',
            license TEXT NOT NULL DEFAULT '',
            unique_id TEXT NOT NULL DEFAULT '',
            size INTEGER,
            installed_size INTEGER,
            origin TEXT NOT NULL,
            maintainer_id INTEGER REFERENCES maintainers(id),
            build_time INTEGER,
            commit_id TEXT NOT NULL DEFAULT 'unknown',
            provider_priority INTEGER,
            UNIQUE(repo, arch, name, version)
        );

        CREATE INDEX idx_packages_name ON packages(name, arch);
        CREATE INDEX idx_packages_origin ON packages(origin, arch);
        CREATE INDEX idx_packages_maintainer ON packages(maintainer_id);

        CREATE TABLE files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
            file TEXT NOT NULL,
            path TEXT NOT NULL
        );

        CREATE INDEX idx_files_package ON files(package_id);

        CREATE TABLE provides (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            operator TEXT,
            version TEXT
        );

        CREATE INDEX idx_provides_package ON provides(package_id);
        CREATE INDEX idx_provides_name ON provides(name);

        CREATE TABLE depends (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            operator TEXT,
            version TEXT
        );

        CREATE INDEX idx_depends_package ON depends(package_id);
        CREATE INDEX idx_depends_name ON depends(name);

        CREATE TABLE install_if (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            package_id INTEGER NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            operator TEXT,
            version TEXT
        );

        CREATE INDEX idx_install_if_package ON install_if(package_id);
        ",
    )?;

    Ok(())
}
