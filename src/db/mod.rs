// src/db/mod.rs

//! SQLite storage for the package index
//!
//! Every connection runs in WAL mode with foreign keys enforced, so readers
//! keep seeing the last committed snapshot while a sync writes.

pub mod models;
pub mod paths;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Busy timeout used by [`open`]
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the database file (and its directory) and bring the schema up to date
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::InitError(format!(
                "Failed to create database directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    open(path)?;
    Ok(())
}

/// Open a connection with the default busy timeout
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Open a connection, configure it and run pending migrations
pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Connection> {
    let path = path.as_ref();
    debug!("Opening database {}", path.display());

    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::migrate(&conn)?;

    Ok(conn)
}

/// Run `f` inside a deferred transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let result = f(&tx)?;
    tx.commit()?;
    Ok(result)
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction
///
/// Acquiring the write lock is attempted up to `attempts` times, sleeping
/// `delay` between attempts. Only busy/locked failures are retried; once
/// the attempts are used up the result is [`Error::StorageBusy`]. Errors
/// raised by `f` roll the transaction back and are returned as-is.
pub fn immediate_transaction<T, F>(
    conn: &mut Connection,
    attempts: u32,
    delay: Duration,
    f: F,
) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
            Ok(tx) => {
                let result = f(&tx)?;
                tx.commit()?;
                return Ok(result);
            }
            Err(e) => {
                let err = Error::from(e);
                if !err.is_lock_contention() {
                    return Err(err);
                }
                warn!(
                    "Database is locked (attempt {}/{}): {}",
                    attempt, attempts, err
                );
                if attempt < attempts {
                    std::thread::sleep(delay);
                }
            }
        }
    }

    Err(Error::StorageBusy { attempts })
}
