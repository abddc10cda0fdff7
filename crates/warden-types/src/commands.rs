//! Validated mutation commands.
//!
//! A command only exists once every field has passed validation: the
//! constructors are the sole way to build one, and deserialization goes
//! through the same constructors (`#[serde(try_from = ...)]`), so a decoded
//! command is as trustworthy as a hand-built one.

pub mod org;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::safe::{self, SafeStringError};
use crate::status::{Status, UnknownStatus};

pub use org::{CreateOrg, UpdateOwner};
pub use user::{CreateUser, UpdateDisplayName, UpdatePassword};

/// Why a command could not be built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("field `{field}`: {source}")]
    Unsafe {
        field: &'static str,
        #[source]
        source: SafeStringError,
    },

    #[error("status code {0} is out of range")]
    StatusOutOfRange(i64),

    #[error("status may not be set to unconfirmed")]
    StatusUnconfirmed,
}

impl From<UnknownStatus> for CommandError {
    fn from(e: UnknownStatus) -> Self {
        Self::StatusOutOfRange(e.0)
    }
}

/// Run a free-form string field through the safe-string validator.
pub(crate) fn safe_field(field: &'static str, value: &str) -> Result<(), CommandError> {
    safe::string_is(value).map_err(|source| CommandError::Unsafe { field, source })
}

/// Like [`safe_field`], plus the id-shape check.
pub(crate) fn id_field(field: &'static str, value: &str) -> Result<(), CommandError> {
    safe_field(field, value)?;
    safe::id_is(value).map_err(|source| CommandError::Unsafe { field, source })
}

/// Set the status of an org or a user. Both entities share this command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UpdateStatusRecord")]
pub struct UpdateStatus {
    id: String,
    status: Status,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateStatusRecord {
    id: String,
    status: i64,
}

impl TryFrom<UpdateStatusRecord> for UpdateStatus {
    type Error = CommandError;

    fn try_from(r: UpdateStatusRecord) -> Result<Self, Self::Error> {
        Self::new(r.id, r.status)
    }
}

impl UpdateStatus {
    /// Validate `id` and map the raw `status_code`.
    ///
    /// Unknown codes fail with [`CommandError::StatusOutOfRange`]; the code
    /// for `Unconfirmed` is known but never settable and fails with
    /// [`CommandError::StatusUnconfirmed`].
    pub fn new(id: impl Into<String>, status_code: i64) -> Result<Self, CommandError> {
        let id = id.into();
        id_field("id", &id)?;
        let status = Status::try_from(status_code)?;
        if status == Status::Unconfirmed {
            return Err(CommandError::StatusUnconfirmed);
        }
        Ok(Self { id, status })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }
}
