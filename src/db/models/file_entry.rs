// src/db/models/file_entry.rs

//! FileEntry model - files shipped by a package

use crate::error::Result;
use crate::index::split_file_path;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use serde::Serialize;

/// A file owned by a package, stored as (file name, directory)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub id: Option<i64>,
    pub package_id: i64,
    pub file: String,
    pub path: String,
}

/// Exact-match filter for searching files across packages
///
/// Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct ContentsFilter {
    pub repo: Option<String>,
    pub arch: Option<String>,
    /// Owning package name
    pub name: Option<String>,
    pub file: Option<String>,
    pub path: Option<String>,
}

impl ContentsFilter {
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        for (column, value) in [
            ("p.repo", &self.repo),
            ("p.arch", &self.arch),
            ("p.name", &self.name),
            ("f.file", &self.file),
            ("f.path", &self.path),
        ] {
            if let Some(value) = value {
                values.push(Value::Text(value.clone()));
                clauses.push(format!("{column} = ?{}", values.len()));
            }
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

/// A file together with the package that ships it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    pub repo: String,
    pub arch: String,
    pub name: String,
    pub file: String,
    pub path: String,
}

impl FileEntry {
    /// Create an entry from an absolute path
    pub fn new(package_id: i64, full_path: &str) -> Self {
        let (file, path) = split_file_path(full_path);
        Self {
            id: None,
            package_id,
            file,
            path,
        }
    }

    /// Absolute path of this file
    pub fn full_path(&self) -> String {
        match self.path.as_str() {
            "/" => format!("/{}", self.file),
            "" => self.file.clone(),
            dir => format!("{dir}/{}", self.file),
        }
    }

    /// Insert this file entry into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO files (package_id, file, path) VALUES (?1, ?2, ?3)",
            params![&self.package_id, &self.file, &self.path],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find all files for a package, ordered by directory then name
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package_id, file, path FROM files
             WHERE package_id = ?1 ORDER BY path, file",
        )?;

        let files = stmt
            .query_map([package_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(files)
    }

    /// Files matching a filter with their owning package, ordered by directory then name
    pub fn search(
        conn: &Connection,
        filter: &ContentsFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentEntry>> {
        let (where_clause, mut values) = filter.where_clause();

        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));
        let sql = format!(
            "SELECT p.repo, p.arch, p.name, f.file, f.path FROM files f
             JOIN packages p ON p.id = f.package_id
             {where_clause}
             ORDER BY f.path, f.file, p.repo, p.arch, p.name
             LIMIT ?{} OFFSET ?{}",
            values.len() - 1,
            values.len()
        );

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(ContentEntry {
                    repo: row.get(0)?,
                    arch: row.get(1)?,
                    name: row.get(2)?,
                    file: row.get(3)?,
                    path: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Count files matching a filter
    pub fn count_matching(conn: &Connection, filter: &ContentsFilter) -> Result<i64> {
        let (where_clause, values) = filter.where_clause();
        let sql = format!(
            "SELECT COUNT(*) FROM files f
             JOIN packages p ON p.id = f.package_id
             {where_clause}"
        );
        let count = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            file: row.get(2)?,
            path: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path() {
        assert_eq!(FileEntry::new(1, "/usr/bin/ls").full_path(), "/usr/bin/ls");
        assert_eq!(FileEntry::new(1, "/.PKGINFO").full_path(), "/.PKGINFO");
    }
}
