//! Process-wide key/value settings, such as the root org id.

use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// Key under which the root org id is stored.
pub const ROOT_ORG: &str = "root_org";

/// The value stored under `key`, if any.
pub fn get_opt(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?)
}

/// The value stored under `key`; `NotFound` when unset.
pub fn get(conn: &Connection, key: &str) -> Result<String> {
    get_opt(conn, key)?.ok_or_else(|| DbError::NotFound(format!("setting {key}")))
}

/// Store `value` under `key`, replacing any earlier value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}
