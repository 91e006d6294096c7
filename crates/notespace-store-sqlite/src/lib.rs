use chrono::{DateTime, Utc};
use notespace_storage::{
    AddMemberParams, CreateInvitationParams, CreateNoteParams, CreateWorkspaceParams,
    InvitationRecord, Member, Membership, NoteId, Role, SharedNote, Store, StoreError,
    UpdateNoteParams, UpdateWorkspaceParams, UpsertUserParams, UserId, UserProfile, Workspace,
    WorkspaceId, WorkspaceSettings, WorkspaceWithRole,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        // One connection: writes are serialized and `:memory:` stays a single database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(backend)?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Unique violations become `AlreadyExists`, dangling workspace references `NotFound`.
fn map_write_err(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::AlreadyExists,
        Some(db) if db.is_foreign_key_violation() => StoreError::NotFound,
        _ => StoreError::Backend(e.to_string()),
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("invalid timestamp: {ms}")))
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(|e| StoreError::Backend(e.to_string()))
}

fn parse_role(s: &str) -> Result<Role, StoreError> {
    s.parse().map_err(|e: notespace_storage::ParseRoleError| StoreError::Backend(e.to_string()))
}

// ───────────────────────────── Row types ─────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    email: Option<String>,
    name: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            user_id: UserId(row.user_id),
            email: row.email,
            name: row.name,
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceRow {
    id: String,
    name: String,
    description: String,
    created_by: String,
    invitation_code: String,
    allow_public_read: bool,
    require_approval: bool,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = StoreError;

    fn try_from(row: WorkspaceRow) -> Result<Self, Self::Error> {
        Ok(Workspace {
            id: WorkspaceId(parse_uuid(&row.id)?),
            name: row.name,
            description: row.description,
            created_by: UserId(row.created_by),
            invitation_code: row.invitation_code,
            settings: WorkspaceSettings {
                allow_public_read: row.allow_public_read,
                require_approval: row.require_approval,
            },
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct WorkspaceRoleRow {
    #[sqlx(flatten)]
    workspace: WorkspaceRow,
    role: String,
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    workspace_id: String,
    user_id: String,
    role: String,
    joined_at: i64,
    invited_by: String,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = StoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            workspace_id: WorkspaceId(parse_uuid(&row.workspace_id)?),
            user_id: UserId(row.user_id),
            role: parse_role(&row.role)?,
            joined_at: from_millis(row.joined_at)?,
            invited_by: UserId(row.invited_by),
        })
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    #[sqlx(flatten)]
    membership: MembershipRow,
    email: Option<String>,
    name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    id: String,
    workspace_id: String,
    title: String,
    content: String,
    created_by: String,
    last_edited_by: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<NoteRow> for SharedNote {
    type Error = StoreError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        Ok(SharedNote {
            id: NoteId(parse_uuid(&row.id)?),
            workspace_id: WorkspaceId(parse_uuid(&row.workspace_id)?),
            title: row.title,
            content: row.content,
            created_by: UserId(row.created_by),
            last_edited_by: UserId(row.last_edited_by),
            created_at: from_millis(row.created_at)?,
            updated_at: from_millis(row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InvitationRow {
    token: String,
    workspace_id: String,
    issued_at: i64,
    issued_by: String,
    revoked: bool,
}

impl TryFrom<InvitationRow> for InvitationRecord {
    type Error = StoreError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        Ok(InvitationRecord {
            workspace_id: WorkspaceId(parse_uuid(&row.workspace_id)?),
            token: row.token,
            issued_at: from_millis(row.issued_at)?,
            issued_by: UserId(row.issued_by),
            revoked: row.revoked,
        })
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Users ─────────────────────────────

    async fn upsert_user(&self, params: &UpsertUserParams) -> Result<UserProfile, StoreError> {
        let now = Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT INTO users(user_id, email, name, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                email = COALESCE(excluded.email, users.email),
                name = COALESCE(excluded.name, users.name),
                updated_at = excluded.updated_at",
        )
        .bind(params.user_id.as_str())
        .bind(params.email.as_deref())
        .bind(params.name.as_deref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        self.get_user(&params.user_id).await
    }

    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT user_id, email, name, created_at, updated_at FROM users WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    // ───────────────────────────── Workspaces ─────────────────────────────

    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<Workspace, StoreError> {
        let now = from_millis(Utc::now().timestamp_millis())?;
        let now_ms = now.timestamp_millis();
        let ws_id = params.id.0.to_string();

        // Dropping the transaction on any error rolls back both inserts.
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO workspaces(id, name, description, created_by, invitation_code,
                                    allow_public_read, require_approval, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ws_id)
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.created_by.as_str())
        .bind(&params.invitation_code)
        .bind(params.settings.allow_public_read)
        .bind(params.settings.require_approval)
        .bind(now_ms)
        .bind(now_ms)
        .execute(&mut *tx)
        .await
        .map_err(map_write_err)?;

        sqlx::query(
            "INSERT INTO workspace_members(workspace_id, user_id, role, joined_at, invited_by)
             VALUES(?, ?, ?, ?, ?)",
        )
        .bind(&ws_id)
        .bind(params.created_by.as_str())
        .bind(Role::Admin.as_str())
        .bind(now_ms)
        .bind(params.created_by.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_write_err)?;

        tx.commit().await.map_err(backend)?;

        Ok(Workspace {
            id: params.id,
            name: params.name.clone(),
            description: params.description.clone(),
            created_by: params.created_by.clone(),
            invitation_code: params.invitation_code.clone(),
            settings: params.settings,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError> {
        sqlx::query_as::<_, WorkspaceRow>(
            "SELECT id, name, description, created_by, invitation_code,
                    allow_public_read, require_approval, created_at, updated_at
             FROM workspaces WHERE id = ?",
        )
        .bind(workspace_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn list_workspaces_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<WorkspaceWithRole>, StoreError> {
        // Inner join: memberships pointing at a missing workspace simply drop out.
        let rows = sqlx::query_as::<_, WorkspaceRoleRow>(
            "SELECT w.id, w.name, w.description, w.created_by, w.invitation_code,
                    w.allow_public_read, w.require_approval, w.created_at, w.updated_at,
                    m.role
             FROM workspace_members m
             JOIN workspaces w ON w.id = m.workspace_id
             WHERE m.user_id = ?
             ORDER BY m.joined_at, w.id",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|row| {
                Ok(WorkspaceWithRole {
                    role: parse_role(&row.role)?,
                    workspace: row.workspace.try_into()?,
                })
            })
            .collect()
    }

    async fn update_workspace(
        &self,
        workspace_id: &WorkspaceId,
        params: &UpdateWorkspaceParams,
    ) -> Result<Workspace, StoreError> {
        let result = sqlx::query(
            "UPDATE workspaces
             SET name = COALESCE(?, name),
                 description = COALESCE(?, description),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(params.name.as_deref())
        .bind(params.description.as_deref())
        .bind(Utc::now().timestamp_millis())
        .bind(workspace_id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_workspace(workspace_id).await
    }

    async fn update_workspace_settings(
        &self,
        workspace_id: &WorkspaceId,
        settings: &WorkspaceSettings,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE workspaces
             SET allow_public_read = ?, require_approval = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(settings.allow_public_read)
        .bind(settings.require_approval)
        .bind(Utc::now().timestamp_millis())
        .bind(workspace_id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_invitation_code(
        &self,
        workspace_id: &WorkspaceId,
        code: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE workspaces SET invitation_code = ?, updated_at = ? WHERE id = ?",
        )
        .bind(code)
        .bind(Utc::now().timestamp_millis())
        .bind(workspace_id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ───────────────────────────── Memberships ─────────────────────────────

    async fn get_membership(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<Membership, StoreError> {
        sqlx::query_as::<_, MembershipRow>(
            "SELECT workspace_id, user_id, role, joined_at, invited_by
             FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id.0.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn add_member(&self, params: &AddMemberParams) -> Result<Membership, StoreError> {
        let joined_at = from_millis(Utc::now().timestamp_millis())?;

        sqlx::query(
            "INSERT INTO workspace_members(workspace_id, user_id, role, joined_at, invited_by)
             VALUES(?, ?, ?, ?, ?)",
        )
        .bind(params.workspace_id.0.to_string())
        .bind(params.user_id.as_str())
        .bind(params.role.as_str())
        .bind(joined_at.timestamp_millis())
        .bind(params.invited_by.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;

        Ok(Membership {
            workspace_id: params.workspace_id,
            user_id: params.user_id.clone(),
            role: params.role,
            joined_at,
            invited_by: params.invited_by.clone(),
        })
    }

    async fn list_members(&self, workspace_id: &WorkspaceId) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT m.workspace_id, m.user_id, m.role, m.joined_at, m.invited_by,
                    u.email, u.name
             FROM workspace_members m
             LEFT JOIN users u ON u.user_id = m.user_id
             WHERE m.workspace_id = ?
             ORDER BY m.joined_at, m.user_id",
        )
        .bind(workspace_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|row| {
                Ok(Member {
                    membership: row.membership.try_into()?,
                    email: row.email,
                    name: row.name,
                })
            })
            .collect()
    }

    async fn update_member_role(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        role: Role,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE workspace_members SET role = ? WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(role.as_str())
        .bind(workspace_id.0.to_string())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn remove_member(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?")
                .bind(workspace_id.0.to_string())
                .bind(user_id.as_str())
                .execute(&self.pool)
                .await
                .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_admins(&self, workspace_id: &WorkspaceId) -> Result<u64, StoreError> {
        let (count,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM workspace_members WHERE workspace_id = ? AND role = ?",
        )
        .bind(workspace_id.0.to_string())
        .bind(Role::Admin.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(count.max(0) as u64)
    }

    // ───────────────────────────── Notes ─────────────────────────────

    async fn create_note(&self, params: &CreateNoteParams) -> Result<SharedNote, StoreError> {
        let id = NoteId::generate();
        let now = from_millis(Utc::now().timestamp_millis())?;
        let now_ms = now.timestamp_millis();

        sqlx::query(
            "INSERT INTO workspace_notes(id, workspace_id, title, content, created_by,
                                         last_edited_by, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(params.workspace_id.0.to_string())
        .bind(&params.title)
        .bind(&params.content)
        .bind(params.created_by.as_str())
        .bind(params.created_by.as_str())
        .bind(now_ms)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;

        Ok(SharedNote {
            id,
            workspace_id: params.workspace_id,
            title: params.title.clone(),
            content: params.content.clone(),
            created_by: params.created_by.clone(),
            last_edited_by: params.created_by.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_note(
        &self,
        workspace_id: &WorkspaceId,
        note_id: &NoteId,
    ) -> Result<SharedNote, StoreError> {
        sqlx::query_as::<_, NoteRow>(
            "SELECT id, workspace_id, title, content, created_by, last_edited_by,
                    created_at, updated_at
             FROM workspace_notes WHERE workspace_id = ? AND id = ?",
        )
        .bind(workspace_id.0.to_string())
        .bind(note_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn update_note(
        &self,
        workspace_id: &WorkspaceId,
        note_id: &NoteId,
        params: &UpdateNoteParams,
    ) -> Result<SharedNote, StoreError> {
        let result = sqlx::query(
            "UPDATE workspace_notes
             SET title = COALESCE(?, title),
                 content = COALESCE(?, content),
                 last_edited_by = ?,
                 updated_at = ?
             WHERE workspace_id = ? AND id = ?",
        )
        .bind(params.title.as_deref())
        .bind(params.content.as_deref())
        .bind(params.edited_by.as_str())
        .bind(Utc::now().timestamp_millis())
        .bind(workspace_id.0.to_string())
        .bind(note_id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_note(workspace_id, note_id).await
    }

    async fn delete_note(
        &self,
        workspace_id: &WorkspaceId,
        note_id: &NoteId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM workspace_notes WHERE workspace_id = ? AND id = ?")
            .bind(workspace_id.0.to_string())
            .bind(note_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_notes(&self, workspace_id: &WorkspaceId) -> Result<Vec<SharedNote>, StoreError> {
        // v7 note ids are time-ordered, so they break updated_at ties by recency.
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, workspace_id, title, content, created_by, last_edited_by,
                    created_at, updated_at
             FROM workspace_notes
             WHERE workspace_id = ?
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(workspace_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(SharedNote::try_from).collect()
    }

    // ───────────────────────────── Invitations ─────────────────────────────

    async fn record_invitation(
        &self,
        params: &CreateInvitationParams,
    ) -> Result<InvitationRecord, StoreError> {
        sqlx::query(
            "INSERT INTO workspace_invitations(token, workspace_id, issued_at, issued_by)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(token) DO NOTHING",
        )
        .bind(&params.token)
        .bind(params.workspace_id.0.to_string())
        .bind(params.issued_at.timestamp_millis())
        .bind(params.issued_by.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;

        self.get_invitation(&params.token).await
    }

    async fn get_invitation(&self, token: &str) -> Result<InvitationRecord, StoreError> {
        sqlx::query_as::<_, InvitationRow>(
            "SELECT token, workspace_id, issued_at, issued_by, revoked
             FROM workspace_invitations WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn list_invitations(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<InvitationRecord>, StoreError> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            "SELECT token, workspace_id, issued_at, issued_by, revoked
             FROM workspace_invitations
             WHERE workspace_id = ?
             ORDER BY issued_at DESC, token",
        )
        .bind(workspace_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(InvitationRecord::try_from).collect()
    }

    async fn revoke_invitation(
        &self,
        workspace_id: &WorkspaceId,
        token: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE workspace_invitations SET revoked = 1 WHERE workspace_id = ? AND token = ?",
        )
        .bind(workspace_id.0.to_string())
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
