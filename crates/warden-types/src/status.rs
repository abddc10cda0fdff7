//! Lifecycle status shared by orgs and users.

use serde::{Deserialize, Serialize};

/// Lifecycle status. Persisted as a small integer.
///
/// `Unconfirmed` only ever describes a freshly inserted user; no update may
/// target it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Status {
    #[default]
    Unconfirmed,
    Active,
    Inactive,
}

/// A status code outside the known range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown status code: {0}")]
pub struct UnknownStatus(pub i64);

impl Status {
    /// The persisted integer code.
    pub const fn code(self) -> i64 {
        match self {
            Self::Unconfirmed => 0,
            Self::Active => 1,
            Self::Inactive => 2,
        }
    }
}

impl TryFrom<i64> for Status {
    type Error = UnknownStatus;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unconfirmed),
            1 => Ok(Self::Active),
            2 => Ok(Self::Inactive),
            other => Err(UnknownStatus(other)),
        }
    }
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        status.code()
    }
}
