//! Membership types.

use chrono::{DateTime, Utc};

use super::{Role, UserId, WorkspaceId};

/// The (workspace, user, role) authorization fact. Unique per (workspace, user).
#[derive(Clone, Debug)]
pub struct Membership {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub invited_by: UserId,
}

/// Parameters for adding a member to a workspace
#[derive(Clone, Debug)]
pub struct AddMemberParams {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    pub invited_by: UserId,
}

/// Membership joined with the member's profile, when one is known
#[derive(Clone, Debug)]
pub struct Member {
    pub membership: Membership,
    pub email: Option<String>,
    pub name: Option<String>,
}
