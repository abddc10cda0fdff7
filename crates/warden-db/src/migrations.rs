//! Forward-only migrations keyed on `PRAGMA user_version`.
//!
//! Step `n` in [`STEPS`] takes the database from version `n` to `n + 1`.
//! Each step and its version bump commit together. A database written by a
//! newer build is refused rather than touched.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// SQL batches, oldest first.
const STEPS: [&str; SCHEMA_VERSION as usize] = [schema::SCHEMA_V1];

/// The version recorded in the database file.
pub fn user_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring `conn` up to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database is at v{found}, this build knows up to v{SCHEMA_VERSION}"
        )));
    }

    for (from, sql) in STEPS.iter().enumerate().skip(found as usize) {
        let to = from as u32 + 1;
        tracing::info!(from, to, "migrating database");

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", to)?;
        tx.commit()?;
    }

    Ok(())
}
