// src/lib.rs

//! apkdex: apk repository index ingester
//!
//! Keeps one SQLite database per branch in sync with the remote
//! `APKINDEX` files of a set of repositories and architectures, and serves
//! read-only lookups over the result.
//!
//! # Architecture
//!
//! - Decoding: `apk adbdump` text is parsed into an arena tree
//! - Extraction: the tree is projected into typed package records
//! - Sync: per-pair diffs by natural key, applied in one transaction per branch
//! - Queries: package lookups, dependency resolution, rendered text indexes

pub mod cache;
pub mod config;
pub mod db;
pub mod dump;
mod error;
pub mod index;
pub mod query;
pub mod resolver;
pub mod sync;
pub mod version;

pub use cache::IndexCache;
pub use config::Config;
pub use error::{Error, Result};
pub use index::{DepOp, DepSpec, PackageKey, PackageMeta};
pub use resolver::{DependencyResolver, Resolution};
pub use sync::{Ingestor, SyncReport};
