// src/index/mod.rs

//! Package records and the dependency string grammar
//!
//! Turns a decoded repository index into [`PackageMeta`] records keyed by
//! their natural [`PackageKey`].

mod depspec;
mod extract;
mod package;

pub use depspec::{DepOp, DepSpec};
pub use extract::{extract_packages, index_by_key, paths_from_archive, paths_to_files};
pub use package::{PackageKey, PackageMeta, parse_maintainer, split_file_path};
