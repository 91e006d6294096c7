//! Common test helpers and utilities for server tests.

use std::sync::Arc;

use notespace_storage::*;
use notespace_store_sqlite::SqliteStore;

use crate::config::ServerConfig;
use crate::handlers::{invitations, users, workspaces};
use crate::identity::Identity;
use crate::server::NotespaceServer;

/// Test helper: Create a NotespaceServer with in-memory SQLite
pub async fn create_test_server() -> NotespaceServer {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    NotespaceServer::new(store, ServerConfig::default())
}

/// Test helper: Sync a user profile so it can create workspaces
pub async fn create_test_user(server: &NotespaceServer, id: &str) -> UserId {
    let identity = Identity {
        user_id: UserId::new(id),
        email: Some(format!("{id}@example.com")),
        name: Some(id.to_string()),
    };
    users::sync_user(server, &identity).await.unwrap();
    identity.user_id
}

/// Test helper: Create a workspace owned by `owner` through the handler
pub async fn create_test_workspace(
    server: &NotespaceServer,
    owner: &UserId,
    name: &str,
) -> WorkspaceId {
    workspaces::create_workspace(server, owner, name, "")
        .await
        .unwrap()
        .id
}

/// Test helper: Generate an invitation as `admin` and redeem it as `user`
pub async fn join_workspace(
    server: &NotespaceServer,
    ws: &WorkspaceId,
    admin: &UserId,
    user: &UserId,
) -> Membership {
    let invite = invitations::generate_invitation(server, admin, ws)
        .await
        .unwrap();
    invitations::redeem_invitation(server, user, &invite.token)
        .await
        .unwrap()
        .membership
}

/// Test helper: Add a member with an explicit role directly through the store
pub async fn add_member_with_role(
    server: &NotespaceServer,
    ws: &WorkspaceId,
    user: &UserId,
    role: Role,
    invited_by: &UserId,
) {
    server
        .store
        .add_member(&AddMemberParams {
            workspace_id: *ws,
            user_id: user.clone(),
            role,
            invited_by: invited_by.clone(),
        })
        .await
        .unwrap();
}

/// Test helper: Current role of `user` in `ws`, `None` if not a member
pub async fn role_of(server: &NotespaceServer, ws: &WorkspaceId, user: &UserId) -> Option<Role> {
    server.check_role(ws, user).await.unwrap()
}
