//! Audit log queries.

use rusqlite::Connection;
use uuid::Uuid;
use warden_types::audit::AuditCode;

use crate::Result;

/// Shape version of audit rows.
pub const AUDIT_SCHEMA_VERSION: u32 = 0;

/// A stored audit row.
#[derive(Debug, Clone)]
pub struct AuditRow {
    pub id: String,
    pub code: i64,
    pub source: String,
    pub source_id: String,
    pub ctime: i64,
}

/// Insert an audit row for a mutation of `source_id` in table `source`.
pub fn insert(conn: &Connection, code: AuditCode, source: &str, source_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO audit (id, code, source, source_id, schema_version)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            Uuid::new_v4().to_string(),
            code.code(),
            source,
            source_id,
            AUDIT_SCHEMA_VERSION,
        ],
    )?;
    Ok(())
}

/// Insert an audit row, logging instead of failing.
///
/// The mutation being audited has already been written; a lost audit row
/// never undoes it.
pub fn record(conn: &Connection, code: AuditCode, source: &str, source_id: &str) {
    if let Err(e) = insert(conn, code, source, source_id) {
        tracing::warn!(code = code.code(), source, source_id, error = %e, "audit insert failed");
    }
}

/// All audit rows for `source_id`, oldest first.
pub fn list_for(conn: &Connection, source_id: &str) -> Result<Vec<AuditRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, source, source_id, ctime
         FROM audit WHERE source_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt
        .query_map([source_id], |row| {
            Ok(AuditRow {
                id: row.get(0)?,
                code: row.get(1)?,
                source: row.get(2)?,
                source_id: row.get(3)?,
                ctime: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::testing;

    #[test]
    fn test_insert_and_list() {
        let conn = testing::db();
        insert(&conn, AuditCode::OrgOwner, "orgs", "org-1").expect("insert");
        insert(&conn, AuditCode::Status, "orgs", "org-1").expect("insert");
        insert(&conn, AuditCode::Status, "orgs", "org-2").expect("insert");

        let rows = list_for(&conn, "org-1").expect("list");
        let codes: Vec<i64> = rows.iter().map(|r| r.code).collect();
        assert_eq!(codes, vec![101, 10]);
        assert!(rows.iter().all(|r| r.source == "orgs" && r.ctime > 0));
    }

    #[test]
    fn test_record_swallows_failure() {
        let conn = testing::db();
        conn.execute_batch("DROP TABLE audit;").expect("drop");
        // must not panic or propagate
        record(&conn, AuditCode::UserInsert, "users", "user-1");
        assert!(insert(&conn, AuditCode::UserInsert, "users", "user-1").is_err());
    }
}
