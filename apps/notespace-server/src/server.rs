use std::sync::Arc;

use notespace_storage::{Role, Store, StoreError, UserId, WorkspaceId};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::CollabError;

/// Things a caller may ask to do inside a workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    ReadNotes,
    WriteNotes,
    UpdateSettings,
    UpdateWorkspace,
    ManageMembers,
    ManageInvitations,
}

impl Action {
    /// Least role allowed to perform the action.
    pub fn required_role(self) -> Role {
        match self {
            Action::ReadNotes => Role::ReadOnly,
            Action::WriteNotes | Action::UpdateSettings => Role::ReadWrite,
            Action::UpdateWorkspace | Action::ManageMembers | Action::ManageInvitations => {
                Role::Admin
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ReadNotes => "read notes",
            Action::WriteNotes => "write notes",
            Action::UpdateSettings => "update settings",
            Action::UpdateWorkspace => "update the workspace",
            Action::ManageMembers => "manage members",
            Action::ManageInvitations => "manage invitations",
        }
    }
}

#[derive(Clone)]
pub struct NotespaceServer {
    pub store: Arc<dyn Store>,
    pub config: ServerConfig,
}

impl NotespaceServer {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// The caller's role in the workspace, or `None` for non-members.
    pub async fn check_role(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Option<Role>, CollabError> {
        match self.store.get_membership(workspace_id, user_id).await {
            Ok(m) => Ok(Some(m.role)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Allow or deny `action` for `user_id` in `workspace_id`; returns the caller's role.
    pub async fn authorize(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        action: Action,
    ) -> Result<Role, CollabError> {
        let required = action.required_role();
        match self.check_role(workspace_id, user_id).await? {
            Some(role) if role.includes(&required) => Ok(role),
            Some(role) => {
                debug!(
                    workspace_id = %workspace_id,
                    user_id = %user_id,
                    role = %role,
                    action = action.as_str(),
                    "authorization denied: insufficient role"
                );
                Err(CollabError::Forbidden(format!(
                    "role {role} cannot {}",
                    action.as_str()
                )))
            }
            None => {
                debug!(
                    workspace_id = %workspace_id,
                    user_id = %user_id,
                    action = action.as_str(),
                    "authorization denied: not a member"
                );
                Err(CollabError::Forbidden(
                    "not a member of this workspace".to_string(),
                ))
            }
        }
    }
}
