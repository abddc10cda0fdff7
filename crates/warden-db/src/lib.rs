//! # warden-db
//!
//! Storage layer for the Warden administration core: a single SQLite
//! database holding orgs, users, audit rows and process settings.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - `ctime` / `mtime` are Unix seconds assigned by triggers
//! - Database version stored in `PRAGMA user_version`; each row also carries
//!   the shape version of its model in `schema_version`
//!
//! Query functions take a `&Connection`; a `rusqlite::Transaction` derefs to
//! one, so every operation composes into a larger transaction.

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

use warden_crypto::CryptoError;
use warden_types::status::UnknownStatus;

/// Current database version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("expected exactly one row affected, got {0}")]
    RowsAffected(usize),

    /// The referenced org is missing or not Active.
    #[error("related org missing or not active")]
    RelatedOrg,

    /// The referenced user is missing, not Active, or in another org.
    #[error("related user missing, not active, or in another org")]
    RelatedUser,

    /// A stored row has a shape version this build does not read.
    #[error("{table} row has schema version {found}, expected {expected}")]
    ModelMigrate {
        table: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("disallowed value: {0}")]
    DisallowedValue(String),

    #[error(transparent)]
    Status(#[from] UnknownStatus),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open (creating if needed) the store at `path` and migrate it.
pub fn open(path: &Path) -> Result<Connection> {
    prepare(Connection::open(path)?)
}

/// A private in-memory store. Each call yields a separate database.
pub fn open_memory() -> Result<Connection> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection> {
    // In-memory stores stay in "memory" mode.
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "store opened");
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    migrations::run(&conn)?;
    Ok(conn)
}
