//! Invitation handlers: generate, redeem, list, revoke

use chrono::{DateTime, Utc};
use notespace_storage::{
    AddMemberParams, CreateInvitationParams, InvitationRecord, Membership, Role, StoreError,
    UserId, Workspace, WorkspaceId,
};
use tracing::{debug, info};

use crate::error::{missing, CollabError};
use crate::server::{Action, NotespaceServer};
use crate::token::InvitationToken;

#[derive(Clone, Debug)]
pub struct GeneratedInvitation {
    pub invitation_link: String,
    pub invitation_code: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct Redemption {
    pub workspace: Workspace,
    pub membership: Membership,
}

pub async fn generate_invitation(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
) -> Result<GeneratedInvitation, CollabError> {
    let workspace = server
        .store
        .get_workspace(workspace_id)
        .await
        .map_err(missing("workspace"))?;
    server
        .authorize(workspace_id, caller, Action::ManageInvitations)
        .await?;

    let issued_at = Utc::now();
    let token = InvitationToken::issue(workspace.id, &workspace.invitation_code, issued_at);
    let encoded = token.to_string();

    server
        .store
        .record_invitation(&CreateInvitationParams {
            workspace_id: workspace.id,
            token: encoded.clone(),
            issued_at,
            issued_by: caller.clone(),
        })
        .await
        .map_err(missing("workspace"))?;

    info!(workspace_id = %workspace_id, user_id = %caller, "invitation generated");
    Ok(GeneratedInvitation {
        invitation_link: server.config.invitation_link(&encoded),
        invitation_code: workspace.invitation_code,
        token: encoded,
        expires_at: token.expires_at(),
    })
}

/// Self-service join. Checks run in a fixed order: malformed, expired, unknown or
/// stale or revoked, already a member.
pub async fn redeem_invitation(
    server: &NotespaceServer,
    caller: &UserId,
    raw_token: &str,
) -> Result<Redemption, CollabError> {
    redeem_invitation_at(server, caller, raw_token, Utc::now()).await
}

pub(crate) async fn redeem_invitation_at(
    server: &NotespaceServer,
    caller: &UserId,
    raw_token: &str,
    now: DateTime<Utc>,
) -> Result<Redemption, CollabError> {
    let token: InvitationToken = raw_token.parse()?;

    if token.is_expired_at(now) {
        debug!(user_id = %caller, "invitation rejected: expired");
        return Err(CollabError::Expired);
    }

    let workspace_id = token.workspace_id()?;
    let workspace = match server.store.get_workspace(&workspace_id).await {
        Ok(ws) => ws,
        Err(StoreError::NotFound) => return Err(CollabError::InvalidToken),
        Err(e) => return Err(e.into()),
    };
    if workspace.invitation_code != token.code {
        debug!(workspace_id = %workspace_id, user_id = %caller, "invitation rejected: stale code");
        return Err(CollabError::InvalidToken);
    }

    match server.store.get_invitation(raw_token).await {
        Ok(record) if record.revoked || record.workspace_id != workspace_id => {
            debug!(workspace_id = %workspace_id, user_id = %caller, "invitation rejected: revoked");
            return Err(CollabError::InvalidToken);
        }
        Ok(_) | Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    if server.check_role(&workspace_id, caller).await?.is_some() {
        return Err(CollabError::AlreadyMember);
    }

    let membership = server
        .store
        .add_member(&AddMemberParams {
            workspace_id,
            user_id: caller.clone(),
            role: Role::ReadWrite,
            invited_by: workspace.created_by.clone(),
        })
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent redemption by the same user.
            StoreError::AlreadyExists => CollabError::AlreadyMember,
            StoreError::NotFound => CollabError::InvalidToken,
            other => other.into(),
        })?;

    info!(workspace_id = %workspace_id, user_id = %caller, role = %membership.role, "invitation redeemed");
    Ok(Redemption {
        workspace,
        membership,
    })
}

/// Outstanding invitations: not revoked, not expired, issued under the current code.
pub async fn list_invitations(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
) -> Result<Vec<InvitationRecord>, CollabError> {
    server
        .authorize(workspace_id, caller, Action::ManageInvitations)
        .await?;

    let workspace = server
        .store
        .get_workspace(workspace_id)
        .await
        .map_err(missing("workspace"))?;
    let now = Utc::now();

    let records = server
        .store
        .list_invitations(workspace_id)
        .await?
        .into_iter()
        .filter(|record| !record.revoked)
        .filter(|record| match record.token.parse::<InvitationToken>() {
            Ok(token) => !token.is_expired_at(now) && token.code == workspace.invitation_code,
            Err(_) => false,
        })
        .collect();

    Ok(records)
}

pub async fn revoke_invitation(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
    token: &str,
) -> Result<(), CollabError> {
    server
        .authorize(workspace_id, caller, Action::ManageInvitations)
        .await?;

    server
        .store
        .revoke_invitation(workspace_id, token)
        .await
        .map_err(missing("invitation"))?;

    info!(workspace_id = %workspace_id, user_id = %caller, "invitation revoked");
    Ok(())
}
