//! Org mutation commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{id_field, safe_field, CommandError};

/// Create an org together with its owning user.
///
/// `owner_password` is cleartext; the controller derives it before storage.
/// It is never serialized and `Debug` redacts it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CreateOrgRecord")]
pub struct CreateOrg {
    name: String,
    owner_display_name: String,
    owner_email: String,
    #[serde(skip_serializing)]
    owner_password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateOrgRecord {
    name: String,
    owner_display_name: String,
    owner_email: String,
    owner_password: String,
}

impl TryFrom<CreateOrgRecord> for CreateOrg {
    type Error = CommandError;

    fn try_from(r: CreateOrgRecord) -> Result<Self, Self::Error> {
        Self::new(r.name, r.owner_display_name, r.owner_email, r.owner_password)
    }
}

impl CreateOrg {
    pub fn new(
        name: impl Into<String>,
        owner_display_name: impl Into<String>,
        owner_email: impl Into<String>,
        owner_password: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let cmd = Self {
            name: name.into(),
            owner_display_name: owner_display_name.into(),
            owner_email: owner_email.into(),
            owner_password: owner_password.into(),
        };
        safe_field("name", &cmd.name)?;
        safe_field("owner_display_name", &cmd.owner_display_name)?;
        safe_field("owner_email", &cmd.owner_email)?;
        safe_field("owner_password", &cmd.owner_password)?;
        Ok(cmd)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_display_name(&self) -> &str {
        &self.owner_display_name
    }

    pub fn owner_email(&self) -> &str {
        &self.owner_email
    }

    pub fn owner_password(&self) -> &str {
        &self.owner_password
    }
}

impl fmt::Debug for CreateOrg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateOrg")
            .field("name", &self.name)
            .field("owner_display_name", &self.owner_display_name)
            .field("owner_email", &self.owner_email)
            .field("owner_password", &"<redacted>")
            .finish()
    }
}

/// Reassign the owner of an org.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UpdateOwnerRecord")]
pub struct UpdateOwner {
    id: String,
    owner: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateOwnerRecord {
    id: String,
    owner: String,
}

impl TryFrom<UpdateOwnerRecord> for UpdateOwner {
    type Error = CommandError;

    fn try_from(r: UpdateOwnerRecord) -> Result<Self, Self::Error> {
        Self::new(r.id, r.owner)
    }
}

impl UpdateOwner {
    pub fn new(id: impl Into<String>, owner: impl Into<String>) -> Result<Self, CommandError> {
        let cmd = Self {
            id: id.into(),
            owner: owner.into(),
        };
        id_field("id", &cmd.id)?;
        id_field("owner", &cmd.owner)?;
        Ok(cmd)
    }

    /// Org id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Candidate owner's user id.
    pub fn owner(&self) -> &str {
        &self.owner
    }
}
