// src/cache.rs

//! Lazily rendered plain-text indexes
//!
//! The first read of a (branch, repo, arch) index renders it from the
//! database into a cache file; later reads serve that file until a sync
//! invalidates it.

use crate::db::models::{Package, PackageFilter, PackageOrder};
use crate::db::paths;
use crate::error::Result;
use rusqlite::Connection;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Cache of rendered index files
#[derive(Debug, Clone)]
pub struct IndexCache {
    root: PathBuf,
}

impl IndexCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path(&self, branch: &str, repo: &str, arch: &str) -> PathBuf {
        paths::index_cache_path(&self.root, branch, repo, arch)
    }

    /// Path of the rendered index, rendering it first if it is missing
    pub fn render(
        &self,
        conn: &Connection,
        branch: &str,
        repo: &str,
        arch: &str,
    ) -> Result<PathBuf> {
        let path = self.path(branch, repo, arch);
        if path.is_file() {
            return Ok(path);
        }

        debug!("Rendering index {}", path.display());
        let filter = PackageFilter {
            repo: Some(repo.to_string()),
            arch: Some(arch.to_string()),
            order: PackageOrder::Name,
            ..Default::default()
        };
        // a negative LIMIT means no limit in SQLite
        let packages = Package::list(conn, &filter, -1, 0)?;
        let content = render_index(&packages);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // rename so concurrent readers never see a half-written file
        let tmp = path.with_extension("txt.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        Ok(path)
    }

    /// Drop the rendered index; returns whether a file was removed
    pub fn invalidate(&self, branch: &str, repo: &str, arch: &str) -> Result<bool> {
        let path = self.path(branch, repo, arch);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Invalidated index {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Render packages as `X:value` blocks separated by blank lines
pub fn render_index(packages: &[Package]) -> String {
    let mut out = String::new();
    for pkg in packages {
        let build_time = pkg.build_time.map(|t| t.to_string()).unwrap_or_default();
        for (tag, value) in [
            ("P", pkg.name.as_str()),
            ("o", pkg.origin.as_str()),
            ("V", pkg.version.as_str()),
            ("A", pkg.arch.as_str()),
            ("T", pkg.description.as_str()),
            ("U", pkg.url.as_str()),
            ("L", pkg.license.as_str()),
            ("t", build_time.as_str()),
        ] {
            out.push_str(&format!("{tag}:{}\n", value.trim()));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::index::PackageMeta;
    use tempfile::TempDir;

    fn meta(name: &str) -> PackageMeta {
        PackageMeta {
            name: name.to_string(),
            version: "1.0-r0".to_string(),
            origin: name.to_string(),
            description: format!("{name} package "),
            license: "MIT".to_string(),
            build_time: Some(1700000000),
            commit: "unknown".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_index_format() {
        let pkg = Package::from_meta(&meta("zlib"), "main", "x86_64", None);
        assert_eq!(
            render_index(&[pkg]),
            "P:zlib\no:zlib\nV:1.0-r0\nA:x86_64\nT:zlib package\nU:\nL:MIT\nt:1700000000\n\n"
        );
    }

    #[test]
    fn test_render_is_lazy_and_invalidated() {
        let temp = TempDir::new().unwrap();
        let conn = db::open(temp.path().join("index-current.db")).unwrap();
        // zsh is the newer build but the index is rendered by name
        for (name, build_time) in [("zsh", 1800000000), ("bash", 1700000000)] {
            let meta = PackageMeta {
                build_time: Some(build_time),
                ..meta(name)
            };
            Package::from_meta(&meta, "user/extra", "x86_64", None)
                .insert(&conn)
                .unwrap();
        }

        let cache = IndexCache::new(temp.path().join("cache"));
        let path = cache.render(&conn, "current", "user/extra", "x86_64").unwrap();
        assert!(path.ends_with("current/apkindex_user_extra_x86_64.txt"));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("P:bash\n"));
        assert_eq!(content.matches("P:").count(), 2);

        // served from the file until invalidated
        conn.execute("DELETE FROM packages WHERE name = 'zsh'", []).unwrap();
        let again = cache.render(&conn, "current", "user/extra", "x86_64").unwrap();
        assert_eq!(fs::read_to_string(&again).unwrap(), content);

        assert!(cache.invalidate("current", "user/extra", "x86_64").unwrap());
        assert!(!cache.invalidate("current", "user/extra", "x86_64").unwrap());

        let fresh = cache.render(&conn, "current", "user/extra", "x86_64").unwrap();
        assert_eq!(fs::read_to_string(fresh).unwrap().matches("P:").count(), 1);
    }
}
