//! Org controller.

use std::sync::Arc;

use tracing::info;
use warden_db::queries::orgs;
use warden_types::commands::{CreateOrg, UpdateOwner, UpdateStatus};
use warden_types::Org;

use crate::error::{AdminError, Result};
use crate::session::Session;
use crate::state::AppState;

/// Create an org and its owner. Root only.
///
/// The owner password in `cmd` is cleartext and is derived here.
pub async fn create(state: &Arc<AppState>, session: &Session, cmd: CreateOrg) -> Result<Org> {
    session.authorize_create_org()?;

    state
        .bounded(async {
            let password = state
                .derive_password(cmd.owner_password().to_string())
                .await?;
            let org = state
                .write(move |conn, key| {
                    orgs::insert_with_owner(
                        conn,
                        cmd.name(),
                        cmd.owner_display_name(),
                        cmd.owner_email(),
                        &password,
                        key,
                    )
                })
                .await?;
            info!(org = %org.id, by = %session.user.id, "org created");
            Ok::<_, AdminError>(org)
        })
        .await
}

/// Read an org. Members read their own org; root reads any.
pub async fn read(state: &Arc<AppState>, session: &Session, id: &str) -> Result<Org> {
    session.authorize_read_org(id)?;

    let id = id.to_string();
    state
        .bounded(state.read(move |conn, _| orgs::read(conn, &id)))
        .await
}

/// Reassign the org's owner.
pub async fn update_owner(
    state: &Arc<AppState>,
    session: &Session,
    cmd: UpdateOwner,
) -> Result<Org> {
    session.authorize_manage_org(cmd.id())?;

    state
        .bounded(state.write(move |conn, _| {
            let mut org = orgs::read(conn, cmd.id())?;
            orgs::update_owner(conn, &mut org, cmd.owner())?;
            Ok(org)
        }))
        .await
}

/// Set the org's status.
pub async fn update_status(
    state: &Arc<AppState>,
    session: &Session,
    cmd: UpdateStatus,
) -> Result<Org> {
    session.authorize_manage_org(cmd.id())?;

    state
        .bounded(state.write(move |conn, _| {
            let mut org = orgs::read(conn, cmd.id())?;
            orgs::update_status(conn, &mut org, cmd.status())?;
            Ok(org)
        }))
        .await
}
