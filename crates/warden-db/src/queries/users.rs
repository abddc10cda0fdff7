//! User queries.
//!
//! The api secret, display name and email are stored encrypted with the
//! database key. Reads decrypt and digest-verify all three before a `User`
//! is returned.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;
use warden_crypto::aead::{self, Key};
use warden_crypto::digest::sha256_hex;
use warden_types::audit::AuditCode;
use warden_types::user::USER_SCHEMA_VERSION;
use warden_types::{Meta, Status, User, USERS_TABLE};

use super::{audit, conflict_or, orgs, update_column, write_status};
use crate::{DbError, Result};

/// A user prepared for insertion: sensitive fields already encrypted.
#[derive(Debug, Clone)]
pub struct EncryptedUser {
    pub id: String,
    pub api_secret: String,
    pub api_secret_digest: String,
    pub display_name: String,
    pub display_name_digest: String,
    pub email: String,
    pub email_digest: String,
    pub org: String,
    pub password: String,
    pub status: Status,
    pub schema_version: u32,
}

/// Build an insertable Unconfirmed user with a fresh id and api secret.
///
/// `password` must already be derived.
pub fn encrypted(
    display_name: &str,
    email: &str,
    org: &str,
    password: &str,
    key: &Key,
) -> Result<EncryptedUser> {
    let api_secret = Uuid::new_v4().to_string();
    Ok(EncryptedUser {
        id: Uuid::new_v4().to_string(),
        api_secret: aead::encrypt(&api_secret, key)?,
        api_secret_digest: sha256_hex(&api_secret),
        display_name: aead::encrypt(display_name, key)?,
        display_name_digest: sha256_hex(display_name),
        email: aead::encrypt(email, key)?,
        email_digest: sha256_hex(email),
        org: org.to_string(),
        password: password.to_string(),
        status: Status::Unconfirmed,
        schema_version: USER_SCHEMA_VERSION,
    })
}

/// Insert a prepared user.
pub fn insert(conn: &Connection, user: &EncryptedUser) -> Result<()> {
    let inserted = conn
        .execute(
            "INSERT INTO users
             (id, api_secret, api_secret_digest, display_name, display_name_digest,
              email, email_digest, org, password, status, schema_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                user.id,
                user.api_secret,
                user.api_secret_digest,
                user.display_name,
                user.display_name_digest,
                user.email,
                user.email_digest,
                user.org,
                user.password,
                user.status.code(),
                user.schema_version,
            ],
        )
        .map_err(|e| conflict_or(e, "user already exists"))?;

    if inserted != 1 {
        return Err(DbError::RowsAffected(inserted));
    }

    audit::record(conn, AuditCode::UserInsert, USERS_TABLE, &user.id);
    Ok(())
}

/// Create a user in `org`, which must exist and be Active.
pub fn create(
    conn: &Connection,
    display_name: &str,
    email: &str,
    org: &str,
    password: &str,
    key: &Key,
) -> Result<User> {
    if !orgs::exists_active(conn, org)? {
        tracing::error!(op = "users::create", org, "org missing or inactive");
        return Err(DbError::RelatedOrg);
    }

    let user = encrypted(display_name, email, org, password, key)?;
    insert(conn, &user).inspect_err(|e| {
        tracing::error!(op = "users::create", error = %e, "insert");
    })?;

    read(conn, &user.id, key)
}

struct StoredUser {
    api_secret: String,
    api_secret_digest: String,
    display_name: String,
    display_name_digest: String,
    email: String,
    email_digest: String,
    org: String,
    password: String,
    ctime: i64,
    mtime: i64,
    status: i64,
    schema_version: u32,
}

/// Read and decrypt the user with `id`.
pub fn read(conn: &Connection, id: &str, key: &Key) -> Result<User> {
    let stored = conn
        .query_row(
            "SELECT api_secret, api_secret_digest, display_name, display_name_digest,
                    email, email_digest, org, password, ctime, mtime, status, schema_version
             FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(StoredUser {
                    api_secret: row.get(0)?,
                    api_secret_digest: row.get(1)?,
                    display_name: row.get(2)?,
                    display_name_digest: row.get(3)?,
                    email: row.get(4)?,
                    email_digest: row.get(5)?,
                    org: row.get(6)?,
                    password: row.get(7)?,
                    ctime: row.get(8)?,
                    mtime: row.get(9)?,
                    status: row.get(10)?,
                    schema_version: row.get(11)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("user '{id}'")),
            other => DbError::Sqlite(other),
        })?;

    if stored.schema_version != USER_SCHEMA_VERSION {
        tracing::error!(op = "users::read", id, found = stored.schema_version, "schema version");
        return Err(DbError::ModelMigrate {
            table: USERS_TABLE,
            expected: USER_SCHEMA_VERSION,
            found: stored.schema_version,
        });
    }

    let status = Status::try_from(stored.status)?;

    let decrypt = |field: &'static str, ciphertext: &str, digest: &str| {
        aead::decrypt(ciphertext, digest, key).map_err(|e| {
            tracing::error!(op = "users::read", id, field, error = %e, "decrypt");
            DbError::Crypto(e)
        })
    };
    let api_secret = decrypt("api_secret", &stored.api_secret, &stored.api_secret_digest)?;
    let display_name = decrypt(
        "display_name",
        &stored.display_name,
        &stored.display_name_digest,
    )?;
    let email = decrypt("email", &stored.email, &stored.email_digest)?;

    Ok(User {
        id: id.to_string(),
        api_secret,
        api_secret_digest: stored.api_secret_digest,
        display_name,
        display_name_digest: stored.display_name_digest,
        email,
        email_digest: stored.email_digest,
        org: stored.org,
        password: stored.password,
        meta: Meta {
            ctime: stored.ctime,
            mtime: stored.mtime,
            schema_version: stored.schema_version,
            status,
        },
    })
}

/// Number of Active users with `id` in `org` (0 or 1).
pub fn count_active_in_org(conn: &Connection, id: &str, org: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE id = ?1 AND org = ?2 AND status = ?3",
        rusqlite::params![id, org, Status::Active.code()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// The org id of user `id`, if the user exists.
pub fn org_of(conn: &Connection, id: &str) -> Result<Option<String>> {
    let org = conn
        .query_row("SELECT org FROM users WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(org)
}

/// Re-encrypt and store a new display name.
pub fn update_display_name(
    conn: &Connection,
    user: &mut User,
    display_name: &str,
    key: &Key,
) -> Result<()> {
    let encrypted = aead::encrypt(display_name, key)?;
    let digest = sha256_hex(display_name);

    let updated = conn.execute(
        "UPDATE users SET display_name = ?1, display_name_digest = ?2 WHERE id = ?3",
        rusqlite::params![encrypted, digest, user.id],
    )?;
    if updated != 1 {
        tracing::error!(op = "users::update_display_name", id = %user.id, updated, "rows affected");
        return Err(DbError::RowsAffected(updated));
    }

    user.display_name = display_name.to_string();
    user.display_name_digest = digest;
    audit::record(conn, AuditCode::UserDisplayName, USERS_TABLE, &user.id);
    Ok(())
}

/// Store an already-derived password verbatim.
pub fn update_password(conn: &Connection, user: &mut User, password: &str) -> Result<()> {
    update_column(conn, USERS_TABLE, &user.id, "password", &password).inspect_err(|e| {
        tracing::error!(op = "users::update_password", id = %user.id, error = %e, "update");
    })?;

    user.password = password.to_string();
    audit::record(conn, AuditCode::UserPassword, USERS_TABLE, &user.id);
    Ok(())
}

/// Set the user's status. Unconfirmed is rejected.
pub fn update_status(conn: &Connection, user: &mut User, status: Status) -> Result<()> {
    write_status(conn, USERS_TABLE, &user.id, status).inspect_err(|e| {
        tracing::error!(op = "users::update_status", id = %user.id, error = %e, "update");
    })?;

    user.meta.status = status;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::testing::{self, PASSWORD};

    #[test]
    fn test_create_and_read() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");

        let user = create(&conn, "Bob", "bob@x.com", &org.id, PASSWORD, &key).expect("create");
        assert_eq!(user.display_name, "Bob");
        assert_eq!(user.email, "bob@x.com");
        assert_eq!(user.email_digest, sha256_hex("bob@x.com"));
        assert_eq!(user.api_secret_digest, sha256_hex(&user.api_secret));
        assert_eq!(user.org, org.id);
        assert_eq!(user.password, PASSWORD);
        assert_eq!(user.meta.status, Status::Unconfirmed);
        assert_eq!(user.meta.schema_version, USER_SCHEMA_VERSION);
        assert!(user.meta.ctime > 0);

        let again = read(&conn, &user.id, &key).expect("read");
        assert_eq!(again, user);
    }

    #[test]
    fn test_stored_fields_are_encrypted() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");
        let user = create(&conn, "Bob", "bob@x.com", &org.id, PASSWORD, &key).expect("create");

        let (display_name, email): (String, String) = conn
            .query_row(
                "SELECT display_name, email FROM users WHERE id = ?1",
                [&user.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("raw row");
        assert_ne!(display_name, "Bob");
        assert_ne!(email, "bob@x.com");
    }

    #[test]
    fn test_duplicate_email_in_org_conflicts() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");

        create(&conn, "Bob", "bob@x.com", &org.id, PASSWORD, &key).expect("first");
        let result = create(&conn, "Bobby", "bob@x.com", &org.id, PASSWORD, &key);
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[test]
    fn test_same_email_in_other_org_allowed() {
        let mut conn = testing::db();
        let key = testing::key();
        let acme = testing::org(&mut conn, "acme");
        let globex = testing::org(&mut conn, "globex");

        create(&conn, "Bob", "bob@x.com", &acme.id, PASSWORD, &key).expect("acme");
        create(&conn, "Bob", "bob@x.com", &globex.id, PASSWORD, &key).expect("globex");
    }

    #[test]
    fn test_create_in_missing_org() {
        let conn = testing::db();
        let key = testing::key();
        let result = create(&conn, "Bob", "bob@x.com", "no-such-org", PASSWORD, &key);
        assert!(matches!(result, Err(DbError::RelatedOrg)));
    }

    #[test]
    fn test_create_in_inactive_org() {
        let mut conn = testing::db();
        let key = testing::key();
        let mut org = testing::org(&mut conn, "acme");
        orgs::update_status(&conn, &mut org, Status::Inactive).expect("deactivate");

        let result = create(&conn, "Bob", "bob@x.com", &org.id, PASSWORD, &key);
        assert!(matches!(result, Err(DbError::RelatedOrg)));
    }

    #[test]
    fn test_read_missing() {
        let conn = testing::db();
        let result = read(&conn, "missing", &testing::key());
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_read_with_wrong_key_fails() {
        let mut conn = testing::db();
        let org = testing::org(&mut conn, "acme");
        let other = aead::derive_key("another key").expect("key");
        let result = read(&conn, &org.owner, &other);
        assert!(matches!(result, Err(DbError::Crypto(_))));
    }

    #[test]
    fn test_read_detects_tampered_digest() {
        let mut conn = testing::db();
        let org = testing::org(&mut conn, "acme");
        conn.execute(
            "UPDATE users SET email_digest = ?1 WHERE id = ?2",
            rusqlite::params![sha256_hex("mallory@x.com"), org.owner],
        )
        .expect("tamper");

        let result = read(&conn, &org.owner, &testing::key());
        assert!(matches!(
            result,
            Err(DbError::Crypto(warden_crypto::CryptoError::DigestMismatch))
        ));
    }

    #[test]
    fn test_schema_version_mismatch() {
        let mut conn = testing::db();
        let org = testing::org(&mut conn, "acme");
        conn.execute(
            "UPDATE users SET schema_version = 99 WHERE id = ?1",
            [&org.owner],
        )
        .expect("bump");

        let result = read(&conn, &org.owner, &testing::key());
        assert!(matches!(
            result,
            Err(DbError::ModelMigrate {
                table: "users",
                expected: USER_SCHEMA_VERSION,
                found: 99
            })
        ));
    }

    #[test]
    fn test_schema_checked_before_decrypt() {
        let mut conn = testing::db();
        let org = testing::org(&mut conn, "acme");
        conn.execute(
            "UPDATE users SET schema_version = 99 WHERE id = ?1",
            [&org.owner],
        )
        .expect("bump");

        // a wrong key would fail decryption, but the version check comes first
        let other = aead::derive_key("another key").expect("key");
        let result = read(&conn, &org.owner, &other);
        assert!(matches!(result, Err(DbError::ModelMigrate { .. })));
    }

    #[test]
    fn test_update_display_name() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");
        let mut user = read(&conn, &org.owner, &key).expect("read");

        update_display_name(&conn, &mut user, "Alicia", &key).expect("update");
        assert_eq!(user.display_name, "Alicia");
        assert_eq!(user.display_name_digest, sha256_hex("Alicia"));

        let again = read(&conn, &user.id, &key).expect("reread");
        assert_eq!(again.display_name, "Alicia");

        let codes: Vec<i64> = audit::list_for(&conn, &user.id)
            .expect("audit")
            .iter()
            .map(|r| r.code)
            .collect();
        assert_eq!(codes.last(), Some(&AuditCode::UserDisplayName.code()));
    }

    #[test]
    fn test_update_display_name_missing_row() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");
        let mut user = read(&conn, &org.owner, &key).expect("read");
        user.id = "gone".to_string();

        let result = update_display_name(&conn, &mut user, "Alicia", &key);
        assert!(matches!(result, Err(DbError::RowsAffected(0))));
        assert_eq!(user.display_name, "Alice");
    }

    #[test]
    fn test_update_password() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");
        let mut user = read(&conn, &org.owner, &key).expect("read");

        update_password(&conn, &mut user, "$argon2id$v=19$new").expect("update");
        assert_eq!(read(&conn, &user.id, &key).expect("reread").password, "$argon2id$v=19$new");
    }

    #[test]
    fn test_update_status() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");
        let mut user = create(&conn, "Bob", "bob@x.com", &org.id, PASSWORD, &key).expect("create");

        update_status(&conn, &mut user, Status::Active).expect("activate");
        assert_eq!(user.meta.status, Status::Active);
        update_status(&conn, &mut user, Status::Inactive).expect("deactivate");
        assert_eq!(read(&conn, &user.id, &key).expect("reread").meta.status, Status::Inactive);

        for current in [Status::Inactive, Status::Active] {
            update_status(&conn, &mut user, current).expect("set");
            let result = update_status(&conn, &mut user, Status::Unconfirmed);
            assert!(matches!(result, Err(DbError::DisallowedValue(_))));
            assert_eq!(user.meta.status, current);
        }
    }

    #[test]
    fn test_count_active_in_org() {
        let mut conn = testing::db();
        let key = testing::key();
        let org = testing::org(&mut conn, "acme");
        let user = create(&conn, "Bob", "bob@x.com", &org.id, PASSWORD, &key).expect("create");

        assert_eq!(count_active_in_org(&conn, &org.owner, &org.id).expect("count"), 1);
        assert_eq!(count_active_in_org(&conn, &user.id, &org.id).expect("count"), 0);
        assert_eq!(org_of(&conn, &user.id).expect("org"), Some(org.id));
        assert_eq!(org_of(&conn, "missing").expect("org"), None);
    }
}
