//! Shared note handlers: create, update, delete, list

use notespace_storage::{
    CreateNoteParams, NoteId, SharedNote, UpdateNoteParams, UserId, WorkspaceId,
};
use tracing::info;

use crate::error::{missing, CollabError};
use crate::server::{Action, NotespaceServer};

pub const UNTITLED_NOTE: &str = "Untitled Note";

/// Partial note edit; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Blank titles get the placeholder on create; anything else is kept as given.
fn title_or_placeholder(title: &str) -> String {
    if title.trim().is_empty() {
        UNTITLED_NOTE.to_string()
    } else {
        title.to_string()
    }
}

pub async fn create_note(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    caller: &UserId,
    title: &str,
    content: &str,
) -> Result<SharedNote, CollabError> {
    server
        .authorize(workspace_id, caller, Action::WriteNotes)
        .await?;

    let note = server
        .store
        .create_note(&CreateNoteParams {
            workspace_id: *workspace_id,
            title: title_or_placeholder(title),
            content: content.to_string(),
            created_by: caller.clone(),
        })
        .await
        .map_err(missing("workspace"))?;

    info!(workspace_id = %workspace_id, note_id = %note.id, user_id = %caller, "note created");
    Ok(note)
}

pub async fn update_note(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    note_id: &NoteId,
    caller: &UserId,
    update: NoteUpdate,
) -> Result<SharedNote, CollabError> {
    server
        .authorize(workspace_id, caller, Action::WriteNotes)
        .await?;

    let note = server
        .store
        .update_note(
            workspace_id,
            note_id,
            &UpdateNoteParams {
                title: update.title,
                content: update.content,
                edited_by: caller.clone(),
            },
        )
        .await
        .map_err(missing("note"))?;

    info!(workspace_id = %workspace_id, note_id = %note_id, user_id = %caller, "note updated");
    Ok(note)
}

pub async fn delete_note(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    note_id: &NoteId,
    caller: &UserId,
) -> Result<(), CollabError> {
    server
        .authorize(workspace_id, caller, Action::WriteNotes)
        .await?;

    server
        .store
        .delete_note(workspace_id, note_id)
        .await
        .map_err(missing("note"))?;

    info!(workspace_id = %workspace_id, note_id = %note_id, user_id = %caller, "note deleted");
    Ok(())
}

/// Most recently updated first.
pub async fn list_notes(
    server: &NotespaceServer,
    workspace_id: &WorkspaceId,
    caller: &UserId,
) -> Result<Vec<SharedNote>, CollabError> {
    server
        .authorize(workspace_id, caller, Action::ReadNotes)
        .await?;
    Ok(server.store.list_notes(workspace_id).await?)
}
