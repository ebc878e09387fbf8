// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! Repositories are laid out on disk and served through `file://` URLs.
//! Index and archive "blobs" are already in dump text form, so tests run
//! with the `PlainText` dumper instead of a real apk binary.

#![allow(dead_code)]

use apkdex::Config;
use apkdex::db;
use apkdex::dump::PlainText;
use apkdex::index::{DepSpec, PackageMeta};
use apkdex::sync::{Ingestor, RepositoryFetcher};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A package as written into a test index
#[derive(Debug, Clone, Default)]
pub struct TestPackage {
    pub name: String,
    pub version: String,
    pub origin: Option<String>,
    pub maintainer: Option<String>,
    pub depends: Vec<String>,
    pub provides: Vec<String>,
    pub install_if: Vec<String>,
    pub files: Option<Vec<String>>,
    pub priority: Option<i64>,
    pub build_time: Option<i64>,
}

pub fn pkg(name: &str, version: &str) -> TestPackage {
    TestPackage {
        name: name.to_string(),
        version: version.to_string(),
        ..Default::default()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl TestPackage {
    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    pub fn maintainer(mut self, maintainer: &str) -> Self {
        self.maintainer = Some(maintainer.to_string());
        self
    }

    pub fn depends(mut self, depends: &[&str]) -> Self {
        self.depends = strings(depends);
        self
    }

    pub fn provides(mut self, provides: &[&str]) -> Self {
        self.provides = strings(provides);
        self
    }

    pub fn install_if(mut self, install_if: &[&str]) -> Self {
        self.install_if = strings(install_if);
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.files = Some(strings(files));
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn built(mut self, build_time: i64) -> Self {
        self.build_time = Some(build_time);
        self
    }

    /// Extracted form, for inserting directly without a sync
    pub fn meta(&self) -> PackageMeta {
        let specs = |items: &[String]| -> Vec<DepSpec> {
            items.iter().map(|s| DepSpec::parse(s)).collect()
        };
        PackageMeta {
            name: self.name.clone(),
            version: self.version.clone(),
            origin: self.origin.clone().unwrap_or_else(|| self.name.clone()),
            maintainer: self.maintainer.clone(),
            commit: "unknown".to_string(),
            provider_priority: self.priority,
            build_time: self.build_time,
            provides: specs(&self.provides),
            depends: specs(&self.depends),
            install_if: specs(&self.install_if),
            files: self.files.clone(),
            ..Default::default()
        }
    }

    fn write_list(out: &mut String, key: &str, items: &[String]) {
        out.push_str(&format!("    {key}: #{} items\n", items.len()));
        for item in items {
            out.push_str(&format!("      - {item}\n"));
        }
    }

    /// Dump text of this package as an element of the `packages` list
    pub fn to_dump(&self) -> String {
        let mut out = format!("  - name: {}\n    version: {}\n", self.name, self.version);
        out.push_str(&format!("    description: {} test package\n", self.name));
        if let Some(origin) = &self.origin {
            out.push_str(&format!("    origin: {origin}\n"));
        }
        if let Some(maintainer) = &self.maintainer {
            out.push_str(&format!("    maintainer: {maintainer}\n"));
        }
        if let Some(priority) = self.priority {
            out.push_str(&format!("    provider-priority: {priority}\n"));
        }
        if let Some(build_time) = self.build_time {
            out.push_str(&format!("    build-time: {build_time}\n"));
        }
        Self::write_list(&mut out, "depends", &self.depends);
        Self::write_list(&mut out, "provides", &self.provides);
        if !self.install_if.is_empty() {
            Self::write_list(&mut out, "install-if", &self.install_if);
        }
        if let Some(files) = &self.files {
            out.push_str(&format!("    paths: #{} items\n", files.len()));
            out.push_str(&paths_dump(files, "      "));
        }
        out
    }
}

/// Dump text of a `paths` list, one directory entry per file
pub fn paths_dump(files: &[String], indent: &str) -> String {
    let mut out = String::new();
    for file in files {
        let trimmed = file.trim_start_matches('/');
        match trimmed.rsplit_once('/') {
            Some((dir, name)) => {
                out.push_str(&format!("{indent}- name: {dir}\n"));
                out.push_str(&format!("{indent}  files: #1 items\n"));
                out.push_str(&format!("{indent}    - name: {name}\n"));
            }
            None => {
                out.push_str(&format!("{indent}- files: #1 items\n"));
                out.push_str(&format!("{indent}    - name: {trimmed}\n"));
            }
        }
    }
    out
}

/// Dump text of a whole index
pub fn index_dump(packages: &[TestPackage]) -> String {
    let mut out = format!("# index\npackages: #{} items\n", packages.len());
    for package in packages {
        out.push_str(&package.to_dump());
    }
    out
}

/// A throwaway mirror, database directory and cache directory
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn mirror(&self) -> PathBuf {
        self.dir.path().join("mirror")
    }

    pub fn db_dir(&self) -> PathBuf {
        self.dir.path().join("db")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    fn pair_dir(&self, branch: &str, repo: &str, arch: &str) -> PathBuf {
        self.mirror().join(branch).join(repo).join(arch)
    }

    pub fn write_index(&self, branch: &str, repo: &str, arch: &str, packages: &[TestPackage]) {
        self.write_raw_index(branch, repo, arch, &index_dump(packages));
    }

    pub fn write_raw_index(&self, branch: &str, repo: &str, arch: &str, text: &str) {
        let dir = self.pair_dir(branch, repo, arch);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("APKINDEX.tar.gz"), text).unwrap();
    }

    pub fn remove_index(&self, branch: &str, repo: &str, arch: &str) {
        fs::remove_file(self.pair_dir(branch, repo, arch).join("APKINDEX.tar.gz")).unwrap();
    }

    /// Write a package archive whose dump only carries a file tree
    pub fn write_archive(
        &self,
        branch: &str,
        repo: &str,
        arch: &str,
        package: &TestPackage,
        files: &[&str],
    ) {
        let dir = self.pair_dir(branch, repo, arch);
        fs::create_dir_all(&dir).unwrap();
        let files = strings(files);
        let text = format!(
            "info:\n  name: {}\npaths: #{} items\n{}",
            package.name,
            files.len(),
            paths_dump(&files, "  ")
        );
        fs::write(dir.join(format!("{}-{}.apk", package.name, package.version)), text).unwrap();
    }

    /// Configuration for the given repos/arches on branch "current"
    pub fn config(&self, repos: &[&str], arches: &[&str], fetch_files: bool) -> Config {
        let url = url::Url::from_directory_path(self.mirror()).unwrap();
        let quote = |items: &[&str]| {
            items
                .iter()
                .map(|s| format!("\"{s}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let text = format!(
            r#"
[repository]
url = "{url}"
branches = ["current"]
repos = [{repos}]
arches = [{arches}]

[database]
path = "{db}"
lock-retries = 2
lock-retry-delay-ms = 10
busy-timeout-ms = 100

[settings]
index-cache = "{cache}"
fetch-files = {fetch_files}
"#,
            repos = quote(repos),
            arches = quote(arches),
            db = self.db_dir().display(),
            cache = self.cache_dir().display(),
        );
        Config::parse(&text).unwrap()
    }

    pub fn ingestor(&self, config: Config) -> Ingestor {
        Ingestor::new(
            config,
            Box::new(RepositoryFetcher::new().unwrap()),
            Box::new(PlainText),
        )
    }

    pub fn db_path(&self, branch: &str) -> PathBuf {
        self.db_dir().join(format!("index-{branch}.db"))
    }

    pub fn open(&self, branch: &str) -> Connection {
        db::open(self.db_path(branch)).unwrap()
    }
}

/// Create a database with the given packages inserted directly
///
/// Returns (TempDir, Connection) - keep the TempDir alive to prevent cleanup.
pub fn setup_db(packages: &[(&str, &str, TestPackage)]) -> (TempDir, Connection) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut conn = db::open(temp_dir.path().join("index-test.db")).unwrap();

    db::transaction(&mut conn, |tx| {
        for (repo, arch, package) in packages {
            apkdex::sync::insert_package(tx, repo, arch, &package.meta())?;
        }
        Ok(())
    })
    .unwrap();

    (temp_dir, conn)
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn package_id(conn: &Connection, repo: &str, name: &str) -> i64 {
    conn.query_row(
        "SELECT id FROM packages WHERE repo = ?1 AND name = ?2",
        [repo, name],
        |row| row.get(0),
    )
    .unwrap()
}
