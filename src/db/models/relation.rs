// src/db/models/relation.rs

//! Provides, depends and install-if entries
//!
//! The three tables share one shape (name, operator, version) and differ
//! only in meaning, so a single model serves all of them.

use crate::error::Result;
use crate::index::{DepOp, DepSpec};
use rusqlite::{Connection, Row, params};
use serde::Serialize;

/// Which child table a relation lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Provides,
    Depends,
    InstallIf,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [
        RelationKind::Provides,
        RelationKind::Depends,
        RelationKind::InstallIf,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            RelationKind::Provides => "provides",
            RelationKind::Depends => "depends",
            RelationKind::InstallIf => "install_if",
        }
    }
}

/// One `name[<op><version>]` entry owned by a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationEntry {
    pub id: Option<i64>,
    pub package_id: i64,
    pub name: String,
    pub op: Option<DepOp>,
    pub version: Option<String>,
}

impl RelationEntry {
    pub fn new(package_id: i64, spec: &DepSpec) -> Self {
        Self {
            id: None,
            package_id,
            name: spec.name.clone(),
            op: spec.op,
            version: spec.version.clone(),
        }
    }

    pub fn spec(&self) -> DepSpec {
        DepSpec {
            name: self.name.clone(),
            op: self.op,
            version: self.version.clone(),
        }
    }

    /// Insert this entry into the table for `kind`
    pub fn insert(&mut self, conn: &Connection, kind: RelationKind) -> Result<i64> {
        conn.execute(
            &format!(
                "INSERT INTO {} (package_id, name, operator, version) VALUES (?1, ?2, ?3, ?4)",
                kind.table()
            ),
            params![
                &self.package_id,
                &self.name,
                self.op.map(|op| op.as_str()),
                &self.version
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Entries of a package, in insertion order
    pub fn find_by_package(
        conn: &Connection,
        kind: RelationKind,
        package_id: i64,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, package_id, name, operator, version FROM {}
             WHERE package_id = ?1 ORDER BY id",
            kind.table()
        ))?;

        let entries = stmt
            .query_map([package_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Entries with this name across all packages
    pub fn find_by_name(conn: &Connection, kind: RelationKind, name: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, package_id, name, operator, version FROM {}
             WHERE name = ?1 ORDER BY package_id, id",
            kind.table()
        ))?;

        let entries = stmt
            .query_map([name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // Unknown operators are dropped rather than failing the whole row
        let op: Option<String> = row.get(3)?;
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            name: row.get(2)?,
            op: op.and_then(|s| s.parse().ok()),
            version: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::TempDir;

    #[test]
    fn test_insert_each_kind() {
        let temp = TempDir::new().unwrap();
        let conn = db::open(temp.path().join("test.db")).unwrap();
        conn.execute(
            "INSERT INTO packages (repo, arch, name, version, origin)
             VALUES ('main', 'x86_64', 'foo', '1.0', 'foo')",
            [],
        )
        .unwrap();
        let package_id = conn.last_insert_rowid();

        let spec = DepSpec::parse("so:libfoo.so.1=1.0");
        for kind in RelationKind::ALL {
            RelationEntry::new(package_id, &spec).insert(&conn, kind).unwrap();
        }
        RelationEntry::new(package_id, &DepSpec::parse("bar"))
            .insert(&conn, RelationKind::Depends)
            .unwrap();

        let depends =
            RelationEntry::find_by_package(&conn, RelationKind::Depends, package_id).unwrap();
        assert_eq!(depends.len(), 2);
        assert_eq!(depends[0].spec(), spec);
        assert_eq!(depends[1].op, None);

        let provides =
            RelationEntry::find_by_name(&conn, RelationKind::Provides, "so:libfoo.so.1").unwrap();
        assert_eq!(provides.len(), 1);
        assert_eq!(provides[0].op, Some(DepOp::Equal));
        assert_eq!(provides[0].version.as_deref(), Some("1.0"));
    }
}
