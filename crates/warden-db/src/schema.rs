//! SQL schema definitions.
//!
//! Encrypted columns (`api_secret`, `display_name`, `email`) hold hex
//! ciphertext; each is paired with the hex SHA-256 digest of its plaintext.
//! Ciphertext is randomized per write, so uniqueness that must hold on the
//! plaintext is enforced through the digest columns.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Users
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT UNIQUE NOT NULL,
    api_secret TEXT UNIQUE NOT NULL,
    api_secret_digest TEXT UNIQUE NOT NULL,
    display_name TEXT NOT NULL,
    display_name_digest TEXT NOT NULL,
    email TEXT NOT NULL,
    email_digest TEXT NOT NULL,
    org TEXT NOT NULL,
    password TEXT NOT NULL,
    schema_version INTEGER NOT NULL DEFAULT 0,
    status INTEGER NOT NULL,
    ctime INTEGER,
    mtime INTEGER,
    PRIMARY KEY (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS users_email_org ON users (email, org);
CREATE UNIQUE INDEX IF NOT EXISTS users_email_digest_org ON users (email_digest, org);
CREATE INDEX IF NOT EXISTS users_org ON users (org);

CREATE TRIGGER IF NOT EXISTS users_ctime_trigger AFTER INSERT ON users
BEGIN
    UPDATE users SET
        ctime = CAST(strftime('%s', 'now') AS INTEGER),
        mtime = CAST(strftime('%s', 'now') AS INTEGER)
    WHERE id = new.id;
END;

CREATE TRIGGER IF NOT EXISTS users_mtime_trigger AFTER UPDATE ON users
BEGIN
    UPDATE users SET mtime = CAST(strftime('%s', 'now') AS INTEGER)
    WHERE id = new.id;
END;

-- ============================================================
-- Orgs
-- ============================================================

CREATE TABLE IF NOT EXISTS orgs (
    id TEXT UNIQUE NOT NULL,
    name TEXT UNIQUE NOT NULL,
    owner TEXT NOT NULL,
    schema_version INTEGER NOT NULL DEFAULT 0,
    status INTEGER NOT NULL,
    ctime INTEGER,
    mtime INTEGER,
    PRIMARY KEY (id)
);

CREATE TRIGGER IF NOT EXISTS orgs_ctime_trigger AFTER INSERT ON orgs
BEGIN
    UPDATE orgs SET
        ctime = CAST(strftime('%s', 'now') AS INTEGER),
        mtime = CAST(strftime('%s', 'now') AS INTEGER)
    WHERE id = new.id;
END;

CREATE TRIGGER IF NOT EXISTS orgs_mtime_trigger AFTER UPDATE ON orgs
BEGIN
    UPDATE orgs SET mtime = CAST(strftime('%s', 'now') AS INTEGER)
    WHERE id = new.id;
END;

-- ============================================================
-- Audit
-- ============================================================

CREATE TABLE IF NOT EXISTS audit (
    id TEXT UNIQUE NOT NULL,
    code INTEGER NOT NULL,
    source TEXT NOT NULL,
    source_id TEXT NOT NULL,
    schema_version INTEGER NOT NULL DEFAULT 0,
    ctime INTEGER,
    mtime INTEGER,
    PRIMARY KEY (id)
);

CREATE INDEX IF NOT EXISTS audit_source_id ON audit (source_id);

CREATE TRIGGER IF NOT EXISTS audit_ctime_trigger AFTER INSERT ON audit
BEGIN
    UPDATE audit SET
        ctime = CAST(strftime('%s', 'now') AS INTEGER),
        mtime = CAST(strftime('%s', 'now') AS INTEGER)
    WHERE id = new.id;
END;

CREATE TRIGGER IF NOT EXISTS audit_mtime_trigger AFTER UPDATE ON audit
BEGIN
    UPDATE audit SET mtime = CAST(strftime('%s', 'now') AS INTEGER)
    WHERE id = new.id;
END;

-- ============================================================
-- Settings (key/value)
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
