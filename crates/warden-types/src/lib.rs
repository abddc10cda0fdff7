//! # warden-types
//!
//! Shared domain types used across the Warden workspace: the org and user
//! records, their lifecycle [`status::Status`], audit codes, the safe-string
//! validator and the validated mutation commands.

pub mod audit;
pub mod commands;
pub mod org;
pub mod safe;
pub mod status;
pub mod user;

pub use org::Org;
pub use status::Status;
pub use user::User;

/// Table holding org rows.
pub const ORGS_TABLE: &str = "orgs";

/// Table holding user rows.
pub const USERS_TABLE: &str = "users";

/// Metadata common to every stored model.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Meta {
    /// Creation time, Unix seconds, assigned by a storage trigger.
    pub ctime: i64,
    /// Last modification time, Unix seconds, assigned by a storage trigger.
    pub mtime: i64,
    /// Shape version of the stored row.
    pub schema_version: u32,
    /// Lifecycle status.
    pub status: Status,
}
