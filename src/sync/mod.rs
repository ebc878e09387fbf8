// src/sync/mod.rs

//! Synchronization of stored branches with their remote indexes
//!
//! This module provides:
//! - The [`Fetcher`] boundary for index and archive blobs
//! - The pure key-set [`PackageDiff`]
//! - The transactional [`Ingestor`]

mod diff;
mod fetch;
mod ingest;

pub use diff::PackageDiff;
pub use fetch::{FetchOutcome, Fetcher, RepositoryFetcher};
pub use ingest::{Ingestor, PairOutcome, PairReport, SyncReport, insert_package};
