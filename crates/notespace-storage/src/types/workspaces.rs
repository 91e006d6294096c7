//! Workspace types.

use chrono::{DateTime, Utc};

use super::{Role, UserId, WorkspaceId};

/// Workspace record
#[derive(Clone, Debug)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    pub invitation_code: String,
    pub settings: WorkspaceSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reserved policy flags. Stored and reported, not enforced by the join flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkspaceSettings {
    pub allow_public_read: bool,
    pub require_approval: bool,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            allow_public_read: false,
            require_approval: true,
        }
    }
}

/// Parameters for creating a workspace together with its creator's admin membership
#[derive(Clone, Debug)]
pub struct CreateWorkspaceParams {
    pub id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    pub invitation_code: String,
    pub settings: WorkspaceSettings,
}

/// Partial update of workspace display metadata
#[derive(Clone, Debug, Default)]
pub struct UpdateWorkspaceParams {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A workspace joined with the role a particular user holds in it
#[derive(Clone, Debug)]
pub struct WorkspaceWithRole {
    pub workspace: Workspace,
    pub role: Role,
}
