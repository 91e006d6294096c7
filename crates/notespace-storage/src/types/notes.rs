//! Shared note types.

use chrono::{DateTime, Utc};

use super::{NoteId, UserId, WorkspaceId};

/// Note owned by a workspace
#[derive(Clone, Debug)]
pub struct SharedNote {
    pub id: NoteId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub content: String,
    pub created_by: UserId,
    pub last_edited_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a note
#[derive(Clone, Debug)]
pub struct CreateNoteParams {
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub content: String,
    pub created_by: UserId,
}

/// Partial note update; `None` leaves the field unchanged.
/// `last_edited_by` and `updated_at` are refreshed regardless.
#[derive(Clone, Debug)]
pub struct UpdateNoteParams {
    pub title: Option<String>,
    pub content: Option<String>,
    pub edited_by: UserId,
}
