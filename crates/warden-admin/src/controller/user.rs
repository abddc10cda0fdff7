//! User controller.

use std::sync::Arc;

use tracing::info;
use warden_db::queries::users;
use warden_db::DbError;
use warden_types::commands::{CreateUser, UpdateDisplayName, UpdatePassword, UpdateStatus};
use warden_types::User;

use crate::error::{AdminError, Result};
use crate::session::{AuthError, AuthTier, Session};
use crate::state::AppState;

/// Create a user. Root anywhere, an org owner in its own org.
///
/// The password in `cmd` is cleartext and is derived here. New users start
/// Unconfirmed.
pub async fn create(state: &Arc<AppState>, session: &Session, cmd: CreateUser) -> Result<User> {
    session.authorize_create_user(cmd.org())?;

    state
        .bounded(async {
            let password = state.derive_password(cmd.password().to_string()).await?;
            let user = state
                .write(move |conn, key| {
                    users::create(conn, cmd.display_name(), cmd.email(), cmd.org(), &password, key)
                })
                .await?;
            info!(user = %user.id, org = %user.org, by = %session.user.id, "user created");
            Ok::<_, AdminError>(user)
        })
        .await
}

/// The gate a user operation must pass.
#[derive(Clone, Copy)]
enum Gate {
    /// Root, the owner of the user's org, or the user itself.
    ManageUser,
    /// Root or the owner of the user's org.
    ManageOrg,
}

/// Authorize `session` for user `id` from the user's org alone, before any
/// field is decrypted. Outside root, a missing user and a user the caller
/// may not touch are the same `Forbidden`.
async fn authorize(state: &Arc<AppState>, session: &Session, id: &str, gate: Gate) -> Result<()> {
    let lookup = id.to_string();
    let org = state
        .read_primary(move |conn, _| users::org_of(conn, &lookup))
        .await?;

    let Some(org) = org else {
        return Err(match session.tier {
            AuthTier::Root => DbError::NotFound(format!("user {id}")).into(),
            _ => AuthError::Forbidden.into(),
        });
    };
    match gate {
        Gate::ManageUser => session.authorize_manage_member(&org, id)?,
        Gate::ManageOrg => session.authorize_manage_org(&org)?,
    }
    Ok(())
}

/// Read a user the caller may manage.
pub async fn read(state: &Arc<AppState>, session: &Session, id: &str) -> Result<User> {
    state
        .bounded(async {
            authorize(state, session, id, Gate::ManageUser).await?;
            let id = id.to_string();
            state
                .read(move |conn, key| users::read(conn, &id, key))
                .await
        })
        .await
}

/// Replace the display name.
pub async fn update_display_name(
    state: &Arc<AppState>,
    session: &Session,
    cmd: UpdateDisplayName,
) -> Result<User> {
    state
        .bounded(async {
            authorize(state, session, cmd.id(), Gate::ManageUser).await?;
            state
                .write(move |conn, key| {
                    let mut user = users::read(conn, cmd.id(), key)?;
                    users::update_display_name(conn, &mut user, cmd.display_name(), key)?;
                    Ok(user)
                })
                .await
        })
        .await
}

/// Replace the password. The value in `cmd` is cleartext.
pub async fn update_password(
    state: &Arc<AppState>,
    session: &Session,
    cmd: UpdatePassword,
) -> Result<User> {
    state
        .bounded(async {
            authorize(state, session, cmd.id(), Gate::ManageUser).await?;
            let password = state.derive_password(cmd.password().to_string()).await?;
            state
                .write(move |conn, key| {
                    let mut user = users::read(conn, cmd.id(), key)?;
                    users::update_password(conn, &mut user, &password)?;
                    Ok(user)
                })
                .await
        })
        .await
}

/// Set the user's status. Only root or the owner of the user's org may.
pub async fn update_status(
    state: &Arc<AppState>,
    session: &Session,
    cmd: UpdateStatus,
) -> Result<User> {
    state
        .bounded(async {
            authorize(state, session, cmd.id(), Gate::ManageOrg).await?;
            state
                .write(move |conn, key| {
                    let mut user = users::read(conn, cmd.id(), key)?;
                    users::update_status(conn, &mut user, cmd.status())?;
                    Ok(user)
                })
                .await
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::org;
    use crate::session::resolve;
    use crate::state::testing;
    use warden_crypto::digest::sha256_hex;
    use warden_crypto::password;
    use warden_types::commands::CreateOrg;
    use warden_types::{Org, Status};

    struct Fixture {
        state: Arc<AppState>,
        root: Session,
        acme: Org,
        owner: Session,
    }

    async fn fixture() -> Fixture {
        let (state, creds) = testing::state();
        let root = resolve(&state, Some(&creds.user)).await.expect("root");
        let cmd = CreateOrg::new("acme", "Alice", "alice@x.com", "pw").expect("command");
        let acme = org::create(&state, &root, cmd).await.expect("acme");
        let owner = resolve(&state, Some(&acme.owner)).await.expect("owner");
        Fixture {
            state,
            root,
            acme,
            owner,
        }
    }

    fn bob(org: &str) -> CreateUser {
        CreateUser::new("Bob", "bob@x.com", org, "hunter2").expect("command")
    }

    async fn activate(f: &Fixture, user: &User) -> Session {
        let cmd = UpdateStatus::new(&user.id, Status::Active.code()).expect("command");
        update_status(&f.state, &f.owner, cmd).await.expect("activate");
        resolve(&f.state, Some(&user.id)).await.expect("session")
    }

    #[tokio::test]
    async fn test_owner_creates_user() {
        let f = fixture().await;
        let user = create(&f.state, &f.owner, bob(&f.acme.id)).await.expect("create");
        assert_eq!(user.org, f.acme.id);
        assert_eq!(user.email_digest, sha256_hex("bob@x.com"));
        assert_eq!(user.meta.status, Status::Unconfirmed);
        assert!(password::verify("hunter2", &user.password).expect("verify"));

        let again = create(&f.state, &f.owner, bob(&f.acme.id)).await;
        assert!(matches!(again, Err(AdminError::Db(DbError::Conflict(_)))));
    }

    #[tokio::test]
    async fn test_create_user_gates() {
        let f = fixture().await;

        // owner of acme cannot create in the root org
        assert!(matches!(
            create(&f.state, &f.owner, bob(&f.root.org.id)).await,
            Err(AdminError::Auth(AuthError::Forbidden))
        ));

        let user = create(&f.state, &f.root, bob(&f.acme.id)).await.expect("root creates");
        let member = activate(&f, &user).await;
        assert_eq!(member.tier, AuthTier::User);

        let cmd = CreateUser::new("Carol", "carol@x.com", &f.acme.id, "pw").expect("command");
        assert!(matches!(
            create(&f.state, &member, cmd).await,
            Err(AdminError::Auth(AuthError::Forbidden))
        ));
    }

    #[tokio::test]
    async fn test_create_in_inactive_org() {
        let f = fixture().await;
        let cmd = UpdateStatus::new(&f.acme.id, Status::Inactive.code()).expect("command");
        org::update_status(&f.state, &f.root, cmd).await.expect("deactivate");

        assert!(matches!(
            create(&f.state, &f.root, bob(&f.acme.id)).await,
            Err(AdminError::Db(DbError::RelatedOrg))
        ));
    }

    #[tokio::test]
    async fn test_read_gates() {
        let f = fixture().await;
        let user = create(&f.state, &f.owner, bob(&f.acme.id)).await.expect("create");
        let member = activate(&f, &user).await;

        assert_eq!(read(&f.state, &member, &user.id).await.expect("self").id, user.id);
        assert!(read(&f.state, &f.owner, &user.id).await.is_ok());
        assert!(read(&f.state, &f.root, &user.id).await.is_ok());
        assert!(matches!(
            read(&f.state, &member, &f.acme.owner).await,
            Err(AdminError::Auth(AuthError::Forbidden))
        ));
    }

    #[tokio::test]
    async fn test_update_display_name() {
        let f = fixture().await;
        let user = create(&f.state, &f.owner, bob(&f.acme.id)).await.expect("create");

        let cmd = UpdateDisplayName::new(&user.id, "Robert").expect("command");
        let updated = update_display_name(&f.state, &f.owner, cmd).await.expect("update");
        assert_eq!(updated.display_name, "Robert");
        assert_eq!(
            read(&f.state, &f.owner, &user.id).await.expect("read").display_name_digest,
            sha256_hex("Robert")
        );
    }

    #[tokio::test]
    async fn test_update_password() {
        let f = fixture().await;
        let user = create(&f.state, &f.owner, bob(&f.acme.id)).await.expect("create");
        let member = activate(&f, &user).await;

        let cmd = UpdatePassword::new(&user.id, "new password").expect("command");
        let updated = update_password(&f.state, &member, cmd).await.expect("self update");
        assert!(password::verify("new password", &updated.password).expect("verify"));
        assert!(!password::verify("hunter2", &updated.password).expect("verify"));
    }

    #[tokio::test]
    async fn test_update_status_gates() {
        let f = fixture().await;
        let user = create(&f.state, &f.owner, bob(&f.acme.id)).await.expect("create");
        let member = activate(&f, &user).await;

        // a plain user cannot change its own status
        let cmd = UpdateStatus::new(&user.id, Status::Inactive.code()).expect("command");
        assert!(matches!(
            update_status(&f.state, &member, cmd.clone()).await,
            Err(AdminError::Auth(AuthError::Forbidden))
        ));

        let updated = update_status(&f.state, &f.root, cmd).await.expect("root");
        assert_eq!(updated.meta.status, Status::Inactive);
        assert!(matches!(
            resolve(&f.state, Some(&user.id)).await,
            Err(AdminError::Auth(AuthError::UserNotActive))
        ));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let f = fixture().await;
        let cmd = UpdateDisplayName::new("no-such-user", "X").expect("command");
        assert!(matches!(
            update_display_name(&f.state, &f.root, cmd).await,
            Err(AdminError::Db(DbError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_and_foreign_users_look_alike() {
        let f = fixture().await;
        let user = create(&f.state, &f.owner, bob(&f.acme.id)).await.expect("create");
        let member = activate(&f, &user).await;

        let cmd = CreateOrg::new("globex", "Gus", "gus@globex.com", "pw").expect("command");
        let globex = org::create(&f.state, &f.root, cmd).await.expect("globex");

        for caller in [&member, &f.owner] {
            for id in [globex.owner.as_str(), "no-such-user"] {
                assert!(matches!(
                    read(&f.state, caller, id).await,
                    Err(AdminError::Auth(AuthError::Forbidden))
                ));
                let cmd = UpdateDisplayName::new(id, "Mallory").expect("command");
                assert!(matches!(
                    update_display_name(&f.state, caller, cmd).await,
                    Err(AdminError::Auth(AuthError::Forbidden))
                ));
                let cmd = UpdateStatus::new(id, Status::Inactive.code()).expect("command");
                assert!(matches!(
                    update_status(&f.state, caller, cmd).await,
                    Err(AdminError::Auth(AuthError::Forbidden))
                ));
            }
        }

        // root still tells the two apart
        assert!(matches!(
            read(&f.state, &f.root, "no-such-user").await,
            Err(AdminError::Db(DbError::NotFound(_)))
        ));
        let gus = read(&f.state, &f.root, &globex.owner).await.expect("root reads");
        assert_eq!(gus.display_name, "Gus");
    }
}
