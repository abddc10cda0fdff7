//! Audit record codes.

/// What kind of mutation an audit row records. Stored as [`AuditCode::code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditCode {
    Status,
    OrgInsert,
    OrgOwner,
    UserInsert,
    UserDisplayName,
    UserPassword,
}

impl AuditCode {
    /// The persisted integer code.
    pub const fn code(self) -> i64 {
        match self {
            Self::Status => 10,
            Self::OrgInsert => 100,
            Self::OrgOwner => 101,
            Self::UserInsert => 200,
            Self::UserDisplayName => 201,
            Self::UserPassword => 202,
        }
    }
}
