//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The storage trait the collaboration core depends on.
///
/// Uniqueness of (workspace, user) memberships and (workspace, note) ids is
/// enforced here, not by callers. Every method is a single atomic unit.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Users ──────────────────────────────────────────

    /// Insert a profile, or refresh the stored one (only `Some` fields are overwritten).
    async fn upsert_user(&self, params: &UpsertUserParams) -> Result<UserProfile, StoreError>;

    /// Get a user profile by ID.
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, StoreError>;

    // ───────────────────────────────────── Workspaces ─────────────────────────────────────

    /// Create a workspace and its creator's `admin` membership in one transaction.
    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<Workspace, StoreError>;

    /// Get workspace by ID.
    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError>;

    /// List all workspaces a user is a member of, with the user's role in each.
    /// Memberships whose workspace no longer exists are skipped.
    async fn list_workspaces_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<WorkspaceWithRole>, StoreError>;

    /// Update workspace name and/or description.
    async fn update_workspace(
        &self,
        workspace_id: &WorkspaceId,
        params: &UpdateWorkspaceParams,
    ) -> Result<Workspace, StoreError>;

    /// Replace the workspace policy flags.
    async fn update_workspace_settings(
        &self,
        workspace_id: &WorkspaceId,
        settings: &WorkspaceSettings,
    ) -> Result<(), StoreError>;

    /// Replace the workspace invitation code.
    async fn set_invitation_code(
        &self,
        workspace_id: &WorkspaceId,
        code: &str,
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Memberships ────────────────────────────────────

    /// Get the membership of a user in a workspace.
    async fn get_membership(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Membership, StoreError>;

    /// Add a member. Returns `AlreadyExists` if the (workspace, user) pair is taken.
    async fn add_member(&self, params: &AddMemberParams) -> Result<Membership, StoreError>;

    /// List all members of a workspace, oldest first.
    async fn list_members(&self, workspace_id: &WorkspaceId) -> Result<Vec<Member>, StoreError>;

    /// Change a member's role.
    async fn update_member_role(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), StoreError>;

    /// Remove a member.
    async fn remove_member(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<(), StoreError>;

    /// Count members holding the `admin` role.
    async fn count_admins(&self, workspace_id: &WorkspaceId) -> Result<u64, StoreError>;

    // ───────────────────────────────────── Notes ──────────────────────────────────────────

    /// Create a note (returns the stored record with its generated ID).
    async fn create_note(&self, params: &CreateNoteParams) -> Result<SharedNote, StoreError>;

    /// Get a note within a workspace.
    async fn get_note(
        &self,
        workspace_id: &WorkspaceId,
        note_id: &NoteId,
    ) -> Result<SharedNote, StoreError>;

    /// Apply a partial update to a note.
    async fn update_note(
        &self,
        workspace_id: &WorkspaceId,
        note_id: &NoteId,
        params: &UpdateNoteParams,
    ) -> Result<SharedNote, StoreError>;

    /// Delete a note.
    async fn delete_note(
        &self,
        workspace_id: &WorkspaceId,
        note_id: &NoteId,
    ) -> Result<(), StoreError>;

    /// List all notes in a workspace, most recently updated first.
    async fn list_notes(&self, workspace_id: &WorkspaceId) -> Result<Vec<SharedNote>, StoreError>;

    // ───────────────────────────────────── Invitations ────────────────────────────────────

    /// Record an issued invitation token. Recording the same token twice is a no-op.
    async fn record_invitation(
        &self,
        params: &CreateInvitationParams,
    ) -> Result<InvitationRecord, StoreError>;

    /// Get an invitation record by token.
    async fn get_invitation(&self, token: &str) -> Result<InvitationRecord, StoreError>;

    /// List all invitations issued for a workspace (revoked included), newest first.
    async fn list_invitations(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<InvitationRecord>, StoreError>;

    /// Mark an invitation as revoked.
    async fn revoke_invitation(
        &self,
        workspace_id: &WorkspaceId,
        token: &str,
    ) -> Result<(), StoreError>;
}
