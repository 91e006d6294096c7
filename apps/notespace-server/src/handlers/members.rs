//! Membership handlers: list, change role, remove
//!
//! Every workspace keeps at least one admin. The check reads the current admin
//! count and then writes, so two concurrent demotions of the last two admins can
//! both pass it.

use notespace_storage::{Member, Membership, Role, UserId, WorkspaceId};
use tracing::info;

use crate::error::{missing, CollabError};
use crate::server::{Action, NotespaceServer};

pub async fn list_members(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
) -> Result<Vec<Member>, CollabError> {
    server
        .authorize(workspace_id, caller, Action::ReadNotes)
        .await?;
    Ok(server.store.list_members(workspace_id).await?)
}

async fn ensure_not_last_admin(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    target: &Membership,
) -> Result<(), CollabError> {
    if target.role == Role::Admin && server.store.count_admins(workspace_id).await? <= 1 {
        return Err(CollabError::Conflict(
            "a workspace must keep at least one admin".to_string(),
        ));
    }
    Ok(())
}

pub async fn change_role(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    caller: &UserId,
    target: &UserId,
    new_role: Role,
) -> Result<Membership, CollabError> {
    server
        .authorize(workspace_id, caller, Action::ManageMembers)
        .await?;

    let mut membership = server
        .store
        .get_membership(workspace_id, target)
        .await
        .map_err(missing("member"))?;
    if membership.role == new_role {
        return Ok(membership);
    }
    if new_role != Role::Admin {
        ensure_not_last_admin(server, workspace_id, &membership).await?;
    }

    server
        .store
        .update_member_role(workspace_id, target, new_role)
        .await
        .map_err(missing("member"))?;

    info!(
        workspace_id = %workspace_id,
        user_id = %caller,
        target_user_id = %target,
        from = %membership.role,
        to = %new_role,
        "member role changed"
    );
    membership.role = new_role;
    Ok(membership)
}

/// Admins remove other members; nobody removes themselves.
pub async fn remove_member(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    caller: &UserId,
    target: &UserId,
) -> Result<(), CollabError> {
    server
        .authorize(workspace_id, caller, Action::ManageMembers)
        .await?;

    if caller == target {
        return Err(CollabError::Conflict(
            "admins cannot remove themselves".to_string(),
        ));
    }

    let membership = server
        .store
        .get_membership(workspace_id, target)
        .await
        .map_err(missing("member"))?;
    ensure_not_last_admin(server, workspace_id, &membership).await?;

    server
        .store
        .remove_member(workspace_id, target)
        .await
        .map_err(missing("member"))?;

    info!(
        workspace_id = %workspace_id,
        user_id = %caller,
        target_user_id = %target,
        "member removed"
    );
    Ok(())
}
