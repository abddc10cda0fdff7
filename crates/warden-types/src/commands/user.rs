//! User mutation commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{id_field, safe_field, CommandError};

/// Create a user in an existing, Active org.
///
/// `password` is cleartext; the controller derives it before storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CreateUserRecord")]
pub struct CreateUser {
    display_name: String,
    email: String,
    org: String,
    #[serde(skip_serializing)]
    password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateUserRecord {
    display_name: String,
    email: String,
    org: String,
    password: String,
}

impl TryFrom<CreateUserRecord> for CreateUser {
    type Error = CommandError;

    fn try_from(r: CreateUserRecord) -> Result<Self, Self::Error> {
        Self::new(r.display_name, r.email, r.org, r.password)
    }
}

impl CreateUser {
    pub fn new(
        display_name: impl Into<String>,
        email: impl Into<String>,
        org: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let cmd = Self {
            display_name: display_name.into(),
            email: email.into(),
            org: org.into(),
            password: password.into(),
        };
        safe_field("display_name", &cmd.display_name)?;
        safe_field("email", &cmd.email)?;
        id_field("org", &cmd.org)?;
        safe_field("password", &cmd.password)?;
        Ok(cmd)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("org", &self.org)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Replace a user's display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UpdateDisplayNameRecord")]
pub struct UpdateDisplayName {
    id: String,
    display_name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateDisplayNameRecord {
    id: String,
    display_name: String,
}

impl TryFrom<UpdateDisplayNameRecord> for UpdateDisplayName {
    type Error = CommandError;

    fn try_from(r: UpdateDisplayNameRecord) -> Result<Self, Self::Error> {
        Self::new(r.id, r.display_name)
    }
}

impl UpdateDisplayName {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let cmd = Self {
            id: id.into(),
            display_name: display_name.into(),
        };
        id_field("id", &cmd.id)?;
        safe_field("display_name", &cmd.display_name)?;
        Ok(cmd)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Replace a user's password. The value is cleartext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UpdatePasswordRecord")]
pub struct UpdatePassword {
    id: String,
    #[serde(skip_serializing)]
    password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdatePasswordRecord {
    id: String,
    password: String,
}

impl TryFrom<UpdatePasswordRecord> for UpdatePassword {
    type Error = CommandError;

    fn try_from(r: UpdatePasswordRecord) -> Result<Self, Self::Error> {
        Self::new(r.id, r.password)
    }
}

impl UpdatePassword {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Result<Self, CommandError> {
        let cmd = Self {
            id: id.into(),
            password: password.into(),
        };
        id_field("id", &cmd.id)?;
        safe_field("password", &cmd.password)?;
        Ok(cmd)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for UpdatePassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePassword")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}
