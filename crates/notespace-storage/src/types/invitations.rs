//! Invitation ledger types.

use chrono::{DateTime, Utc};

use super::{UserId, WorkspaceId};

/// An issued invitation token, recorded so it can be listed or revoked individually
#[derive(Clone, Debug)]
pub struct InvitationRecord {
    pub workspace_id: WorkspaceId,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub issued_by: UserId,
    pub revoked: bool,
}

/// Parameters for recording an issued invitation
#[derive(Clone, Debug)]
pub struct CreateInvitationParams {
    pub workspace_id: WorkspaceId,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub issued_by: UserId,
}
