// src/index/extract.rs

//! Projection of a decoded index tree into package records

use super::depspec::DepSpec;
use super::package::{PackageKey, PackageMeta};
use crate::dump::{self, DumpTree, IndexDumper, NodeId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Top-level key holding the package list
const PACKAGES_KEY: &str = "packages";

/// Top-level key holding the file tree of an archive
const PATHS_KEY: &str = "paths";

/// Extract every package from a decoded index
///
/// Elements that are not maps or lack a name/version are skipped.
pub fn extract_packages(tree: &DumpTree) -> Vec<PackageMeta> {
    let Some(list) = tree.path(&[PACKAGES_KEY]) else {
        debug!("Index has no '{}' section", PACKAGES_KEY);
        return Vec::new();
    };

    tree.list_items(list)
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let pkg = extract_one(tree, *node);
            if pkg.is_none() {
                warn!("Skipping package entry #{} without name/version", index);
            }
            pkg
        })
        .collect()
}

fn extract_one(tree: &DumpTree, node: NodeId) -> Option<PackageMeta> {
    let text = |key: &str| tree.scalar_at(node, key).map(str::to_string);
    let number = |key: &str| tree.scalar_at(node, key).and_then(|v| v.trim().parse::<i64>().ok());
    let specs = |key: &str| -> Vec<DepSpec> {
        tree.scalar_list(node, key)
            .into_iter()
            .map(DepSpec::parse)
            .collect()
    };

    let name = text("name")?;
    let version = text("version")?;

    Some(PackageMeta {
        origin: text("origin").unwrap_or_else(|| name.clone()),
        description: text("description").unwrap_or_default(),
        url: text("url").unwrap_or_default(),
        license: text("license").unwrap_or_default(),
        arch: text("arch").unwrap_or_default(),
        unique_id: text("unique-id").unwrap_or_default(),
        size: number("file-size"),
        installed_size: number("installed-size"),
        maintainer: text("maintainer"),
        build_time: number("build-time"),
        commit: text("repo-commit").unwrap_or_else(|| "unknown".to_string()),
        provider_priority: number("provider-priority"),
        provides: specs("provides"),
        depends: specs("depends"),
        install_if: specs("install-if"),
        files: tree.map_get(node, PATHS_KEY).map(|paths| paths_to_files(tree, paths)),
        name,
        version,
    })
}

/// Flatten a `paths` list into absolute file paths
///
/// Each element is a directory map with an optional `name` and an optional
/// `files` list of maps carrying their own `name`.
pub fn paths_to_files(tree: &DumpTree, paths: NodeId) -> Vec<String> {
    let mut result = Vec::new();

    for dir in tree.list_items(paths) {
        let Some(files) = tree.map_get(*dir, "files") else {
            continue;
        };
        let dir_name = tree.scalar_at(*dir, "name");

        for file in tree.list_items(files) {
            let Some(file_name) = tree.scalar_at(*file, "name") else {
                continue;
            };
            match dir_name {
                Some(dir_name) => result.push(format!("/{dir_name}/{file_name}")),
                None => result.push(format!("/{file_name}")),
            }
        }
    }

    result
}

/// File list of a package archive via a scoped decode of its `paths` section
///
/// Archives that cannot be dumped or decoded yield an empty list.
pub fn paths_from_archive(dumper: &dyn IndexDumper, raw: &[u8]) -> Vec<String> {
    match dump::decode_section(dumper, raw, PATHS_KEY) {
        Ok(tree) => tree
            .path(&[PATHS_KEY])
            .map(|paths| paths_to_files(&tree, paths))
            .unwrap_or_default(),
        Err(e) => {
            warn!("Could not read file list from archive: {}", e);
            Vec::new()
        }
    }
}

/// Key packages by natural key, dropping duplicates
///
/// The later entry in index order wins.
pub fn index_by_key(
    packages: Vec<PackageMeta>,
    repo: &str,
    arch: &str,
) -> BTreeMap<PackageKey, PackageMeta> {
    let mut by_key = BTreeMap::new();
    for pkg in packages {
        let key = pkg.key(repo, arch);
        if let Some(previous) = by_key.insert(key.clone(), pkg) {
            warn!(
                "Duplicate package {} in {}/{} (unique-id {}), keeping the later entry",
                key, repo, arch, previous.unique_id
            );
        }
    }
    by_key
}
