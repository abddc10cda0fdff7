//! Org queries.

use rusqlite::Connection;
use uuid::Uuid;
use warden_crypto::aead::Key;
use warden_types::audit::AuditCode;
use warden_types::org::ORG_SCHEMA_VERSION;
use warden_types::{Meta, Org, Status, ORGS_TABLE, USERS_TABLE};

use super::{audit, conflict_or, update_column, users, write_status};
use crate::{DbError, Result};

/// Create an org together with its owner, atomically.
///
/// The owner is inserted Unconfirmed, activated, then the org is inserted
/// Active with that owner. Every step runs in one transaction: if any step
/// fails (a taken org name, say) nothing is left behind.
pub fn create_with_owner(
    conn: &mut Connection,
    name: &str,
    owner_display_name: &str,
    owner_email: &str,
    owner_password: &str,
    key: &Key,
) -> Result<Org> {
    let tx = conn.transaction()?;
    let org = insert_with_owner(
        &tx,
        name,
        owner_display_name,
        owner_email,
        owner_password,
        key,
    )?;
    tx.commit()?;
    Ok(org)
}

/// The body of [`create_with_owner`], for callers that already hold a
/// transaction and want to add their own writes to it.
pub fn insert_with_owner(
    conn: &Connection,
    name: &str,
    owner_display_name: &str,
    owner_email: &str,
    owner_password: &str,
    key: &Key,
) -> Result<Org> {
    let id = Uuid::new_v4().to_string();

    let owner = users::encrypted(owner_display_name, owner_email, &id, owner_password, key)?;
    users::insert(conn, &owner).inspect_err(|e| {
        tracing::error!(op = "orgs::create_with_owner", error = %e, "insert owner");
    })?;
    write_status(conn, USERS_TABLE, &owner.id, Status::Active)?;

    let inserted = conn
        .execute(
            "INSERT INTO orgs (id, name, owner, status, schema_version)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                id,
                name,
                owner.id,
                Status::Active.code(),
                ORG_SCHEMA_VERSION
            ],
        )
        .map_err(|e| {
            tracing::error!(op = "orgs::create_with_owner", error = %e, "insert org");
            conflict_or(e, "org name already in use")
        })?;
    if inserted != 1 {
        return Err(DbError::RowsAffected(inserted));
    }

    audit::record(conn, AuditCode::OrgInsert, ORGS_TABLE, &id);
    tracing::info!(org = %id, owner = %owner.id, "org created");

    read(conn, &id)
}

/// Read the org with `id`.
pub fn read(conn: &Connection, id: &str) -> Result<Org> {
    let (name, owner, ctime, mtime, status, schema_version) = conn
        .query_row(
            "SELECT name, owner, ctime, mtime, status, schema_version
             FROM orgs WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, u32>(5)?,
                ))
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("org '{id}'")),
            other => DbError::Sqlite(other),
        })?;

    if schema_version != ORG_SCHEMA_VERSION {
        tracing::error!(op = "orgs::read", id, found = schema_version, "schema version");
        return Err(DbError::ModelMigrate {
            table: ORGS_TABLE,
            expected: ORG_SCHEMA_VERSION,
            found: schema_version,
        });
    }

    Ok(Org {
        id: id.to_string(),
        name,
        owner,
        meta: Meta {
            ctime,
            mtime,
            schema_version,
            status: Status::try_from(status)?,
        },
    })
}

/// Whether an Active org with `id` exists.
pub fn exists_active(conn: &Connection, id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orgs WHERE id = ?1 AND status = ?2",
        rusqlite::params![id, Status::Active.code()],
        |row| row.get(0),
    )?;
    Ok(count == 1)
}

/// Make `owner` the owner of `org`.
///
/// The candidate must be an Active user of this org.
pub fn update_owner(conn: &Connection, org: &mut Org, owner: &str) -> Result<()> {
    if users::count_active_in_org(conn, owner, &org.id)? != 1 {
        tracing::error!(op = "orgs::update_owner", org = %org.id, owner, "owner check");
        return Err(DbError::RelatedUser);
    }

    update_column(conn, ORGS_TABLE, &org.id, "owner", &owner).inspect_err(|e| {
        tracing::error!(op = "orgs::update_owner", org = %org.id, error = %e, "update");
    })?;

    org.owner = owner.to_string();
    audit::record(conn, AuditCode::OrgOwner, ORGS_TABLE, &org.id);
    Ok(())
}

/// Set the org's status. Unconfirmed is rejected.
pub fn update_status(conn: &Connection, org: &mut Org, status: Status) -> Result<()> {
    write_status(conn, ORGS_TABLE, &org.id, status).inspect_err(|e| {
        tracing::error!(op = "orgs::update_status", org = %org.id, error = %e, "update");
    })?;

    org.meta.status = status;
    Ok(())
}
