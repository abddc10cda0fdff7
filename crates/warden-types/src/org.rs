//! Org (tenant) record.

use serde::{Deserialize, Serialize};

use crate::Meta;

/// Current shape version of org rows.
pub const ORG_SCHEMA_VERSION: u32 = 0;

/// A tenant boundary with exactly one designated owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub id: String,
    /// Unique across all orgs.
    pub name: String,
    /// Id of the owning user. The user belongs to this org and was Active
    /// when assigned.
    pub owner: String,
    pub meta: Meta,
}
