// src/db/paths.rs
//! Centralized path derivation for per-branch databases and cached indexes

use std::path::{Path, PathBuf};

/// Database file holding one branch
pub fn branch_db_path(db_dir: &Path, branch: &str) -> PathBuf {
    db_dir.join(format!("index-{branch}.db"))
}

/// Directory holding the rendered indexes of one branch
pub fn index_cache_dir(cache_dir: &Path, branch: &str) -> PathBuf {
    cache_dir.join(branch)
}

/// Rendered plain-text index of one repository/architecture pair
///
/// Repository names may contain `/` (e.g. "user/nonfree"), which is
/// flattened to `_` so every pair maps to a single file.
pub fn index_cache_path(cache_dir: &Path, branch: &str, repo: &str, arch: &str) -> PathBuf {
    index_cache_dir(cache_dir, branch).join(format!(
        "apkindex_{}_{arch}.txt",
        repo.replace('/', "_")
    ))
}
