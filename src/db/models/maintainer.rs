// src/db/models/maintainer.rs

//! Maintainer model - (name, email) identities shared between packages

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

/// A package maintainer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Maintainer {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
}

impl Maintainer {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: None,
            name,
            email,
        }
    }

    /// Insert or reuse the row with this (name, email) identity
    pub fn upsert(&mut self, conn: &Connection) -> Result<i64> {
        let id = conn.query_row(
            "INSERT INTO maintainers (name, email) VALUES (?1, ?2)
             ON CONFLICT(name, email) DO UPDATE SET name = excluded.name, email = excluded.email
             RETURNING id",
            params![&self.name, &self.email],
            |row| row.get(0),
        )?;

        self.id = Some(id);
        Ok(id)
    }

    /// Find a maintainer by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name, email FROM maintainers WHERE id = ?1")?;
        let maintainer = stmt.query_row([id], Self::from_row).optional()?;
        Ok(maintainer)
    }

    /// All maintainers with the number of packages referencing them
    pub fn list_with_counts(conn: &Connection) -> Result<Vec<(Self, i64)>> {
        let mut stmt = conn.prepare(
            "SELECT m.id, m.name, m.email, COUNT(p.id)
             FROM maintainers m
             LEFT JOIN packages p ON p.maintainer_id = m.id
             GROUP BY m.id
             ORDER BY m.name, m.email",
        )?;

        let maintainers = stmt
            .query_map([], |row| Ok((Self::from_row(row)?, row.get(3)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(maintainers)
    }

    /// Delete maintainers no package refers to; returns how many were removed
    pub fn prune_orphans(conn: &Connection) -> Result<usize> {
        let pruned = conn.execute(
            "DELETE FROM maintainers
             WHERE id NOT IN (
                 SELECT DISTINCT maintainer_id FROM packages WHERE maintainer_id IS NOT NULL
             )",
            [],
        )?;
        Ok(pruned)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            email: row.get(2)?,
        })
    }
}
