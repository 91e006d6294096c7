//! JSON-over-HTTP surface of the collaboration handlers.

use std::future::Future;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use notespace_storage::{
    InvitationRecord, Member, Membership, NoteId, Role, SharedNote, UpdateWorkspaceParams,
    UserId, UserProfile, Workspace, WorkspaceId, WorkspaceSettings, WorkspaceWithRole,
};
use serde::{Deserialize, Serialize};

use crate::error::CollabError;
use crate::handlers::invitations::{GeneratedInvitation, Redemption};
use crate::handlers::notes::NoteUpdate;
use crate::handlers::workspaces::SettingsUpdate;
use crate::handlers::{invitations, members, notes, users, workspaces};
use crate::identity::Identity;
use crate::metrics::RequestTimer;
use crate::server::NotespaceServer;

pub fn router(server: NotespaceServer) -> Router {
    Router::new()
        .route("/api/users/me", put(sync_user))
        .route(
            "/api/workspaces",
            post(create_workspace).get(list_workspaces),
        )
        .route(
            "/api/workspaces/{ws}",
            get(get_workspace).patch(update_workspace),
        )
        .route("/api/workspaces/{ws}/settings", put(update_settings))
        .route(
            "/api/workspaces/{ws}/invitation-code",
            post(rotate_invitation_code),
        )
        .route(
            "/api/workspaces/{ws}/invitations",
            post(generate_invitation).get(list_invitations),
        )
        .route(
            "/api/workspaces/{ws}/invitations/{token}",
            delete(revoke_invitation),
        )
        .route("/api/join/{token}", post(redeem_invitation))
        .route("/api/workspaces/{ws}/members", get(list_members))
        .route(
            "/api/workspaces/{ws}/members/{user}",
            patch(change_role).delete(remove_member),
        )
        .route(
            "/api/workspaces/{ws}/notes",
            get(list_notes).post(create_note),
        )
        .route(
            "/api/workspaces/{ws}/notes/{note}",
            patch(update_note).delete(delete_note),
        )
        .with_state(server)
}

/// Runs one operation under a [`RequestTimer`].
async fn observe<T>(
    operation: &'static str,
    fut: impl Future<Output = Result<T, CollabError>>,
) -> Result<T, CollabError> {
    let timer = RequestTimer::new(operation);
    match fut.await {
        Ok(value) => {
            timer.success();
            Ok(value)
        }
        Err(e) => {
            timer.error(e.kind());
            Err(e)
        }
    }
}

fn parse_workspace_id(raw: &str) -> Result<WorkspaceId, CollabError> {
    raw.parse()
        .map_err(|_| CollabError::NotFound("workspace not found".to_string()))
}

fn parse_note_id(raw: &str) -> Result<NoteId, CollabError> {
    raw.parse()
        .map_err(|_| CollabError::NotFound("note not found".to_string()))
}

// ────────────────────────────────────── Views ──────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for UserView {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id.0,
            email: p.email,
            name: p.name,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub allow_public_read: bool,
    pub require_approval: bool,
}

impl From<WorkspaceSettings> for SettingsView {
    fn from(s: WorkspaceSettings) -> Self {
        Self {
            allow_public_read: s.allow_public_read,
            require_approval: s.require_approval,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_by: String,
    /// Only shown to admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_code: Option<String>,
    pub settings: SettingsView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceView {
    fn new(w: Workspace, role: Option<Role>) -> Self {
        let invitation_code = (role == Some(Role::Admin)).then_some(w.invitation_code);
        Self {
            id: w.id.to_string(),
            name: w.name,
            description: w.description,
            created_by: w.created_by.0,
            invitation_code,
            settings: w.settings.into(),
            role: role.map(|r| r.as_str()),
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

impl From<WorkspaceWithRole> for WorkspaceView {
    fn from(w: WorkspaceWithRole) -> Self {
        Self::new(w.workspace, Some(w.role))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user_id: String,
    pub role: &'static str,
    pub joined_at: DateTime<Utc>,
    pub invited_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<Membership> for MemberView {
    fn from(m: Membership) -> Self {
        Self {
            user_id: m.user_id.0,
            role: m.role.as_str(),
            joined_at: m.joined_at,
            invited_by: m.invited_by.0,
            email: None,
            name: None,
        }
    }
}

impl From<Member> for MemberView {
    fn from(m: Member) -> Self {
        Self {
            email: m.email,
            name: m.name,
            ..m.membership.into()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: String,
    pub workspace_id: String,
    pub title: String,
    pub content: String,
    pub created_by: String,
    pub last_edited_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SharedNote> for NoteView {
    fn from(n: SharedNote) -> Self {
        Self {
            id: n.id.to_string(),
            workspace_id: n.workspace_id.to_string(),
            title: n.title,
            content: n.content,
            created_by: n.created_by.0,
            last_edited_by: n.last_edited_by.0,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedInvitationView {
    pub invitation_link: String,
    pub invitation_code: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<GeneratedInvitation> for GeneratedInvitationView {
    fn from(g: GeneratedInvitation) -> Self {
        Self {
            invitation_link: g.invitation_link,
            invitation_code: g.invitation_code,
            token: g.token,
            expires_at: g.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationView {
    pub token: String,
    pub invitation_link: String,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionView {
    pub workspace: WorkspaceView,
    pub member: MemberView,
}

impl From<Redemption> for RedemptionView {
    fn from(r: Redemption) -> Self {
        let role = r.membership.role;
        Self {
            workspace: WorkspaceView::new(r.workspace, Some(role)),
            member: r.membership.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationCodeView {
    pub invitation_code: String,
}

// ────────────────────────────────────── Bodies ──────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBody {
    pub allow_public_read: Option<bool>,
    pub require_approval: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleBody {
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteBody {
    pub title: Option<String>,
    pub content: Option<String>,
}

// ────────────────────────────────────── Users ──────────────────────────────────────

async fn sync_user(
    State(server): State<NotespaceServer>,
    identity: Identity,
) -> Result<Json<UserView>, CollabError> {
    let profile = observe("sync_user", users::sync_user(&server, &identity)).await?;
    Ok(Json(profile.into()))
}

// ────────────────────────────────────── Workspaces ──────────────────────────────────────

async fn create_workspace(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Json(body): Json<CreateWorkspaceBody>,
) -> Result<(StatusCode, Json<WorkspaceView>), CollabError> {
    let workspace = observe(
        "create_workspace",
        workspaces::create_workspace(&server, &identity.user_id, &body.name, &body.description),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(WorkspaceView::new(workspace, Some(Role::Admin))),
    ))
}

async fn list_workspaces(
    State(server): State<NotespaceServer>,
    identity: Identity,
) -> Result<Json<Vec<WorkspaceView>>, CollabError> {
    let list = observe(
        "list_workspaces",
        workspaces::list_workspaces(&server, &identity.user_id),
    )
    .await?;
    Ok(Json(list.into_iter().map(WorkspaceView::from).collect()))
}

async fn get_workspace(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
) -> Result<Json<WorkspaceView>, CollabError> {
    let found = observe("get_workspace", async {
        let ws = parse_workspace_id(&ws)?;
        workspaces::get_workspace(&server, &identity.user_id, &ws).await
    })
    .await?;
    Ok(Json(found.into()))
}

async fn update_workspace(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
    Json(body): Json<UpdateWorkspaceBody>,
) -> Result<Json<WorkspaceView>, CollabError> {
    let updated = observe("update_workspace", async {
        let ws = parse_workspace_id(&ws)?;
        workspaces::update_workspace(
            &server,
            &identity.user_id,
            &ws,
            UpdateWorkspaceParams {
                name: body.name,
                description: body.description,
            },
        )
        .await
    })
    .await?;
    Ok(Json(WorkspaceView::new(updated, Some(Role::Admin))))
}

async fn update_settings(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
    Json(body): Json<SettingsBody>,
) -> Result<Json<SettingsView>, CollabError> {
    let settings = observe("update_settings", async {
        let ws = parse_workspace_id(&ws)?;
        workspaces::update_settings(
            &server,
            &identity.user_id,
            &ws,
            SettingsUpdate {
                allow_public_read: body.allow_public_read,
                require_approval: body.require_approval,
            },
        )
        .await
    })
    .await?;
    Ok(Json(settings.into()))
}

async fn rotate_invitation_code(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
) -> Result<Json<InvitationCodeView>, CollabError> {
    let invitation_code = observe("rotate_invitation_code", async {
        let ws = parse_workspace_id(&ws)?;
        workspaces::rotate_invitation_code(&server, &identity.user_id, &ws).await
    })
    .await?;
    Ok(Json(InvitationCodeView { invitation_code }))
}

// ────────────────────────────────────── Invitations ──────────────────────────────────────

async fn generate_invitation(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
) -> Result<(StatusCode, Json<GeneratedInvitationView>), CollabError> {
    let generated = observe("generate_invitation", async {
        let ws = parse_workspace_id(&ws)?;
        invitations::generate_invitation(&server, &identity.user_id, &ws).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(generated.into())))
}

async fn list_invitations(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
) -> Result<Json<Vec<InvitationView>>, CollabError> {
    let records = observe("list_invitations", async {
        let ws = parse_workspace_id(&ws)?;
        invitations::list_invitations(&server, &identity.user_id, &ws).await
    })
    .await?;
    let views = records
        .into_iter()
        .map(|r: InvitationRecord| InvitationView {
            invitation_link: server.config.invitation_link(&r.token),
            token: r.token,
            issued_by: r.issued_by.0,
            issued_at: r.issued_at,
        })
        .collect();
    Ok(Json(views))
}

async fn revoke_invitation(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path((ws, token)): Path<(String, String)>,
) -> Result<StatusCode, CollabError> {
    observe("revoke_invitation", async {
        let ws = parse_workspace_id(&ws)?;
        invitations::revoke_invitation(&server, &identity.user_id, &ws, &token).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn redeem_invitation(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(token): Path<String>,
) -> Result<Json<RedemptionView>, CollabError> {
    let redemption = observe(
        "redeem_invitation",
        invitations::redeem_invitation(&server, &identity.user_id, &token),
    )
    .await?;
    Ok(Json(redemption.into()))
}

// ────────────────────────────────────── Members ──────────────────────────────────────

async fn list_members(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
) -> Result<Json<Vec<MemberView>>, CollabError> {
    let list = observe("list_members", async {
        let ws = parse_workspace_id(&ws)?;
        members::list_members(&server, &identity.user_id, &ws).await
    })
    .await?;
    Ok(Json(list.into_iter().map(MemberView::from).collect()))
}

async fn change_role(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path((ws, user)): Path<(String, String)>,
    Json(body): Json<ChangeRoleBody>,
) -> Result<Json<MemberView>, CollabError> {
    let membership = observe("change_role", async {
        let ws = parse_workspace_id(&ws)?;
        let role: Role = body
            .role
            .parse()
            .map_err(|e: notespace_storage::ParseRoleError| {
                CollabError::Validation(e.to_string())
            })?;
        members::change_role(&server, &ws, &identity.user_id, &UserId(user), role).await
    })
    .await?;
    Ok(Json(membership.into()))
}

async fn remove_member(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path((ws, user)): Path<(String, String)>,
) -> Result<StatusCode, CollabError> {
    observe("remove_member", async {
        let ws = parse_workspace_id(&ws)?;
        members::remove_member(&server, &ws, &identity.user_id, &UserId(user)).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────── Notes ──────────────────────────────────────

async fn list_notes(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
) -> Result<Json<Vec<NoteView>>, CollabError> {
    let list = observe("list_notes", async {
        let ws = parse_workspace_id(&ws)?;
        notes::list_notes(&server, &ws, &identity.user_id).await
    })
    .await?;
    Ok(Json(list.into_iter().map(NoteView::from).collect()))
}

async fn create_note(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path(ws): Path<String>,
    Json(body): Json<CreateNoteBody>,
) -> Result<(StatusCode, Json<NoteView>), CollabError> {
    let note = observe("create_note", async {
        let ws = parse_workspace_id(&ws)?;
        notes::create_note(&server, &ws, &identity.user_id, &body.title, &body.content).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

async fn update_note(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path((ws, note)): Path<(String, String)>,
    Json(body): Json<UpdateNoteBody>,
) -> Result<Json<NoteView>, CollabError> {
    let updated = observe("update_note", async {
        let ws = parse_workspace_id(&ws)?;
        let note = parse_note_id(&note)?;
        notes::update_note(
            &server,
            &ws,
            &note,
            &identity.user_id,
            NoteUpdate {
                title: body.title,
                content: body.content,
            },
        )
        .await
    })
    .await?;
    Ok(Json(updated.into()))
}

async fn delete_note(
    State(server): State<NotespaceServer>,
    identity: Identity,
    Path((ws, note)): Path<(String, String)>,
) -> Result<StatusCode, CollabError> {
    observe("delete_note", async {
        let ws = parse_workspace_id(&ws)?;
        let note = parse_note_id(&note)?;
        notes::delete_note(&server, &ws, &note, &identity.user_id).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
