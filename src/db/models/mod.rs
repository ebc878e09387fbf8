// src/db/models/mod.rs

//! Data models for index database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading and deleting records.

mod file_entry;
mod maintainer;
mod package;
mod relation;

pub use file_entry::{ContentEntry, ContentsFilter, FileEntry};
pub use maintainer::Maintainer;
pub use package::{Package, PackageFilter, PackageOrder};
pub use relation::{RelationEntry, RelationKind};
