//! User record.
//!
//! A `User` held in memory carries decrypted values. The encrypted forms
//! exist only in the store; each sensitive field is paired with the SHA-256
//! digest of its plaintext.

use serde::{Deserialize, Serialize};

use crate::Meta;

/// Current shape version of user rows.
pub const USER_SCHEMA_VERSION: u32 = 0;

/// A member of exactly one org.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub api_secret: String,
    pub api_secret_digest: String,
    pub display_name: String,
    pub display_name_digest: String,
    pub email: String,
    pub email_digest: String,
    /// Owning org id; immutable.
    pub org: String,
    /// Derived (Argon2id) password. Never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub meta: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    #[test]
    fn test_password_never_serialized() {
        let user = User {
            id: "u1".to_string(),
            api_secret: "secret".to_string(),
            api_secret_digest: "d0".to_string(),
            display_name: "Alice".to_string(),
            display_name_digest: "d1".to_string(),
            email: "alice@x.com".to_string(),
            email_digest: "d2".to_string(),
            org: "o1".to_string(),
            password: "$argon2id$v=19$derived".to_string(),
            meta: Meta {
                status: Status::Active,
                ..Meta::default()
            },
        };

        let json = serde_json::to_value(&user).expect("serialize");
        assert!(json.get("password").is_none());
        assert_eq!(json["display_name"], "Alice");
        assert_eq!(json["meta"]["status"], 1);
    }
}
