// src/index/package.rs

//! Package records extracted from a repository index

use super::depspec::DepSpec;
use serde::Serialize;
use std::fmt;

/// Natural identity of a package within one branch
///
/// Packages are never updated in place: a new version is a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageKey {
    pub repo: String,
    pub arch: String,
    pub name: String,
    pub version: String,
}

impl PackageKey {
    pub fn new(
        repo: impl Into<String>,
        arch: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            arch: arch.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// One package as described by the remote index, before storage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageMeta {
    pub name: String,
    pub version: String,
    pub description: String,
    pub url: String,
    pub license: String,
    pub arch: String,
    pub unique_id: String,
    pub size: Option<i64>,
    pub installed_size: Option<i64>,
    /// Source package; same as `name` unless this is a subpackage
    pub origin: String,
    /// Raw `Name <email>` string
    pub maintainer: Option<String>,
    pub build_time: Option<i64>,
    pub commit: String,
    pub provider_priority: Option<i64>,
    pub provides: Vec<DepSpec>,
    pub depends: Vec<DepSpec>,
    pub install_if: Vec<DepSpec>,
    /// Absolute file paths, if the index embedded them
    pub files: Option<Vec<String>>,
}

impl PackageMeta {
    /// Natural key of this package in the given repository
    pub fn key(&self, repo: &str, arch: &str) -> PackageKey {
        PackageKey::new(repo, arch, &self.name, &self.version)
    }
}

/// Split a `Name <email>` maintainer string
///
/// Returns `None` when no email address is present. A bare address yields
/// an empty display name.
pub fn parse_maintainer(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim();

    if let (Some(open), Some(close)) = (raw.rfind('<'), raw.rfind('>')) {
        if open < close {
            let email = raw[open + 1..close].trim();
            if email.is_empty() {
                return None;
            }
            let name = raw[..open].trim().trim_matches('"').trim();
            return Some((name.to_string(), email.to_string()));
        }
    }

    if raw.contains('@') && !raw.contains(char::is_whitespace) {
        return Some((String::new(), raw.to_string()));
    }

    None
}

/// Split an absolute file path into `(file name, directory)`
pub fn split_file_path(path: &str) -> (String, String) {
    match path.rfind('/') {
        Some(0) => (path[1..].to_string(), "/".to_string()),
        Some(pos) => (path[pos + 1..].to_string(), path[..pos].to_string()),
        None => (path.to_string(), String::new()),
    }
}
