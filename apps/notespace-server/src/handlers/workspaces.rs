//! Workspace handlers: create, list, get, update, settings, rotate code

use notespace_storage::{
    CreateWorkspaceParams, StoreError, UpdateWorkspaceParams, UserId, Workspace, WorkspaceId,
    WorkspaceSettings, WorkspaceWithRole,
};
use tracing::info;

use crate::error::{missing, CollabError};
use crate::server::{Action, NotespaceServer};
use crate::token::generate_invitation_code;

/// Partial update of the policy flags; `None` keeps the stored value.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettingsUpdate {
    pub allow_public_read: Option<bool>,
    pub require_approval: Option<bool>,
}

pub async fn create_workspace(
    server: &NotespaceServer,
    caller: &UserId,
    name: &str,
    description: &str,
) -> Result<Workspace, CollabError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CollabError::Validation(
            "workspace name is required".to_string(),
        ));
    }

    // The creator must be a known (synced) user.
    match server.store.get_user(caller).await {
        Ok(_) => {}
        Err(StoreError::NotFound) => {
            return Err(CollabError::Validation(format!("unknown user: {caller}")))
        }
        Err(e) => return Err(e.into()),
    }

    let workspace = server
        .store
        .create_workspace(&CreateWorkspaceParams {
            id: WorkspaceId::generate(),
            name: name.to_string(),
            description: description.trim().to_string(),
            created_by: caller.clone(),
            invitation_code: generate_invitation_code(),
            settings: WorkspaceSettings::default(),
        })
        .await?;

    info!(workspace_id = %workspace.id, user_id = %caller, "workspace created");
    Ok(workspace)
}

pub async fn list_workspaces(
    server: &NotespaceServer,
    caller: &UserId,
) -> Result<Vec<WorkspaceWithRole>, CollabError> {
    Ok(server.store.list_workspaces_for_user(caller).await?)
}

pub async fn get_workspace(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
) -> Result<WorkspaceWithRole, CollabError> {
    let workspace = server
        .store
        .get_workspace(workspace_id)
        .await
        .map_err(missing("workspace"))?;
    let role = server
        .authorize(workspace_id, caller, Action::ReadNotes)
        .await?;

    Ok(WorkspaceWithRole { workspace, role })
}

pub async fn update_workspace(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
    update: UpdateWorkspaceParams,
) -> Result<Workspace, CollabError> {
    let name = match update.name {
        Some(name) if name.trim().is_empty() => {
            return Err(CollabError::Validation(
                "workspace name cannot be blank".to_string(),
            ))
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };

    server
        .authorize(workspace_id, caller, Action::UpdateWorkspace)
        .await?;

    let workspace = server
        .store
        .update_workspace(
            workspace_id,
            &UpdateWorkspaceParams {
                name,
                description: update.description.map(|d| d.trim().to_string()),
            },
        )
        .await
        .map_err(missing("workspace"))?;

    info!(workspace_id = %workspace_id, user_id = %caller, "workspace updated");
    Ok(workspace)
}

pub async fn update_settings(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
    update: SettingsUpdate,
) -> Result<WorkspaceSettings, CollabError> {
    server
        .authorize(workspace_id, caller, Action::UpdateSettings)
        .await?;

    let current = server
        .store
        .get_workspace(workspace_id)
        .await
        .map_err(missing("workspace"))?
        .settings;
    let settings = WorkspaceSettings {
        allow_public_read: update
            .allow_public_read
            .unwrap_or(current.allow_public_read),
        require_approval: update.require_approval.unwrap_or(current.require_approval),
    };

    server
        .store
        .update_workspace_settings(workspace_id, &settings)
        .await
        .map_err(missing("workspace"))?;

    info!(
        workspace_id = %workspace_id,
        user_id = %caller,
        allow_public_read = settings.allow_public_read,
        require_approval = settings.require_approval,
        "workspace settings updated"
    );
    Ok(settings)
}

/// Replace the invitation code, invalidating every token issued under the old one.
pub async fn rotate_invitation_code(
    server: &NotespaceServer,
    caller: &UserId,
    workspace_id: &WorkspaceId,
) -> Result<String, CollabError> {
    server
        .store
        .get_workspace(workspace_id)
        .await
        .map_err(missing("workspace"))?;
    server
        .authorize(workspace_id, caller, Action::ManageInvitations)
        .await?;

    let code = generate_invitation_code();
    server
        .store
        .set_invitation_code(workspace_id, &code)
        .await
        .map_err(missing("workspace"))?;

    info!(workspace_id = %workspace_id, user_id = %caller, "invitation code rotated");
    Ok(code)
}
