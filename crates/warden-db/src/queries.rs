//! Query functions organized by table.

pub mod audit;
pub mod orgs;
pub mod settings;
pub mod users;

use rusqlite::{ffi, Connection, ToSql};
use warden_types::audit::AuditCode;
use warden_types::Status;

use crate::{DbError, Result};

/// Set one column of the row with `id`.
///
/// Zero rows affected means the row does not exist; any other count besides
/// one is a defect.
pub(crate) fn update_column(
    conn: &Connection,
    table: &'static str,
    id: &str,
    column: &'static str,
    value: &dyn ToSql,
) -> Result<()> {
    let sql = format!("UPDATE {table} SET {column} = ?1 WHERE id = ?2");
    match conn.execute(&sql, rusqlite::params![value, id])? {
        1 => Ok(()),
        0 => Err(DbError::NotFound(format!("{table} row '{id}'"))),
        n => Err(DbError::RowsAffected(n)),
    }
}

/// Write a new status and record it in the audit log.
///
/// Unconfirmed is a creation-only status and is never written here.
pub(crate) fn write_status(
    conn: &Connection,
    table: &'static str,
    id: &str,
    status: Status,
) -> Result<()> {
    if status == Status::Unconfirmed {
        return Err(DbError::DisallowedValue(format!(
            "{table} status may not be set to unconfirmed"
        )));
    }
    update_column(conn, table, id, "status", &status.code())?;
    audit::record(conn, AuditCode::Status, table, id);
    Ok(())
}

/// Map unique/primary-key violations to [`DbError::Conflict`].
pub(crate) fn conflict_or(e: rusqlite::Error, what: &str) -> DbError {
    if is_unique_violation(&e) {
        DbError::Conflict(what.to_string())
    } else {
        DbError::Sqlite(e)
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}
