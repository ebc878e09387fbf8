// src/sync/diff.rs

//! Diff between stored and freshly fetched package sets
//!
//! Package identity is the full natural key, so there is no update case:
//! a version bump shows up as one removal plus one addition.

use crate::index::PackageKey;
use std::collections::BTreeSet;

/// Keys to insert and keys to delete for one repository/architecture pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDiff {
    pub to_add: BTreeSet<PackageKey>,
    pub to_remove: BTreeSet<PackageKey>,
}

impl PackageDiff {
    /// Compare stored keys against the remote set
    ///
    /// An empty remote set is valid and removes everything.
    pub fn compute(stored: &BTreeSet<PackageKey>, remote: &BTreeSet<PackageKey>) -> Self {
        Self {
            to_add: remote.difference(stored).cloned().collect(),
            to_remove: stored.difference(remote).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
