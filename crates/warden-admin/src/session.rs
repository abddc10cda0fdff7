//! Session derivation and authorization tiers.
//!
//! A request names its caller by user id. [`resolve`] turns that id into a
//! [`Session`]: the Active user, its Active org, and the tier the pair
//! grants. The gate methods on `Session` decide what the caller may do.

use std::sync::Arc;

use warden_db::queries::{orgs, users};
use warden_db::DbError;
use warden_types::{Org, Status, User};

use crate::error::{AdminError, Result};
use crate::state::AppState;

/// Header carrying the caller's user id.
pub const ID_HEADER: &str = "X-Warden-ID";

/// Authorization tier, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthTier {
    /// Any Active user of an Active org.
    User,
    /// The owner of a non-root org.
    Org,
    /// Any user of the root org.
    Root,
}

/// Why a caller was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing: {0}")]
    MissingHeader(&'static str),

    #[error("user not found")]
    UserNotFound,

    #[error("user not active")]
    UserNotActive,

    #[error("org not found")]
    OrgNotFound,

    #[error("org not active")]
    OrgNotActive,

    #[error("token request invalid")]
    InvalidProof,

    #[error("token decode error: {0}")]
    InvalidToken(String),

    #[error("token contents incorrect")]
    TokenMismatch,

    #[error("token expired")]
    Expired,

    #[error("auth inadequate")]
    Forbidden,

    #[error("internal error")]
    Internal(String),
}

/// The resolved caller of one request.
#[derive(Debug, Clone)]
pub struct Session {
    pub org: Org,
    pub user: User,
    pub tier: AuthTier,
}

impl Session {
    fn classify(org: Org, user: User, root_org: &str) -> Self {
        let tier = if org.id == root_org {
            AuthTier::Root
        } else if org.owner == user.id {
            AuthTier::Org
        } else {
            AuthTier::User
        };
        Self { org, user, tier }
    }

    /// Only root may create orgs.
    pub fn authorize_create_org(&self) -> std::result::Result<(), AuthError> {
        match self.tier {
            AuthTier::Root => Ok(()),
            _ => Err(AuthError::Forbidden),
        }
    }

    /// Root may create users anywhere; an org owner only in its own org.
    pub fn authorize_create_user(&self, org: &str) -> std::result::Result<(), AuthError> {
        self.authorize_manage_org(org)
    }

    /// Root may manage any org; an org owner only its own.
    pub fn authorize_manage_org(&self, org: &str) -> std::result::Result<(), AuthError> {
        match self.tier {
            AuthTier::Root => Ok(()),
            AuthTier::Org if self.org.id == org => Ok(()),
            _ => Err(AuthError::Forbidden),
        }
    }

    /// Any member may read its own org; root may read every org.
    pub fn authorize_read_org(&self, org: &str) -> std::result::Result<(), AuthError> {
        if self.tier == AuthTier::Root || self.org.id == org {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Root manages every user, an org owner the users of its org, and a
    /// plain user only itself.
    pub fn authorize_manage_user(&self, user: &User) -> std::result::Result<(), AuthError> {
        self.authorize_manage_member(&user.org, &user.id)
    }

    /// [`Session::authorize_manage_user`] for a user known only by id and org.
    pub fn authorize_manage_member(
        &self,
        org: &str,
        user_id: &str,
    ) -> std::result::Result<(), AuthError> {
        match self.tier {
            AuthTier::Root => Ok(()),
            AuthTier::Org if self.org.id == org => Ok(()),
            _ if self.user.id == user_id => Ok(()),
            _ => Err(AuthError::Forbidden),
        }
    }
}

/// Resolve the caller named by `caller_id`.
pub async fn resolve(state: &Arc<AppState>, caller_id: Option<&str>) -> Result<Session> {
    let id = match caller_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(AuthError::MissingHeader(ID_HEADER).into()),
    };

    state
        .bounded(async {
            let user = state
                .read(move |conn, key| users::read(conn, &id, key))
                .await
                .map_err(|e| rejection(e, AuthError::UserNotFound))?;
            if user.meta.status != Status::Active {
                return Err(AuthError::UserNotActive.into());
            }

            let org_id = user.org.clone();
            let org = state
                .read(move |conn, _| orgs::read(conn, &org_id))
                .await
                .map_err(|e| rejection(e, AuthError::OrgNotFound))?;
            if org.meta.status != Status::Active {
                return Err(AuthError::OrgNotActive.into());
            }

            Ok::<_, AdminError>(Session::classify(org, user, state.root_org()))
        })
        .await
}

/// Map a store failure during resolution. A missing row becomes
/// `not_found`; timeouts and worker failures pass through; anything else is
/// logged and reported as internal.
fn rejection(e: AdminError, not_found: AuthError) -> AdminError {
    match e {
        AdminError::Db(DbError::NotFound(_)) => not_found.into(),
        AdminError::Timeout(_) | AdminError::Worker(_) => e,
        other => {
            tracing::debug!(error = %other, "session resolution failed");
            AuthError::Internal(other.to_string()).into()
        }
    }
}
