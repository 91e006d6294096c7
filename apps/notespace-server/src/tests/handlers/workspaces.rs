//! Workspace handler tests.

use super::super::common::*;
use crate::error::CollabError;
use crate::handlers::workspaces::{self, SettingsUpdate};
use notespace_storage::*;

#[tokio::test]
async fn handler_create_workspace() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;

    let ws = workspaces::create_workspace(&server, &alice, "  Team Notes ", "shared")
        .await
        .unwrap();

    assert_eq!(ws.name, "Team Notes");
    assert_eq!(ws.description, "shared");
    assert_eq!(ws.created_by, alice);
    assert_eq!(ws.invitation_code.len(), 16);
    assert_eq!(ws.invitation_code, ws.invitation_code.to_uppercase());
    assert_eq!(ws.settings, WorkspaceSettings::default());
    assert!(!ws.settings.allow_public_read);
    assert!(ws.settings.require_approval);
    assert_eq!(role_of(&server, &ws.id, &alice).await, Some(Role::Admin));
}

#[tokio::test]
async fn create_workspace_rejects_blank_name() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;

    let err = workspaces::create_workspace(&server, &alice, "   ", "")
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Validation(_)));
    assert!(workspaces::list_workspaces(&server, &alice)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn create_workspace_requires_known_creator() {
    let server = create_test_server().await;

    let err = workspaces::create_workspace(&server, &UserId::new("ghost"), "W", "")
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Validation(_)));
}

#[tokio::test]
async fn handler_list_workspaces_reports_role() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = create_test_user(&server, "bob").await;

    let mine = create_test_workspace(&server, &alice, "mine").await;
    let theirs = create_test_workspace(&server, &bob, "theirs").await;
    add_member_with_role(&server, &theirs, &alice, Role::ReadOnly, &bob).await;

    let list = workspaces::list_workspaces(&server, &alice).await.unwrap();
    assert_eq!(list.len(), 2);
    let role_in = |id: WorkspaceId| {
        list.iter()
            .find(|w| w.workspace.id == id)
            .map(|w| w.role)
            .unwrap()
    };
    assert_eq!(role_in(mine), Role::Admin);
    assert_eq!(role_in(theirs), Role::ReadOnly);
}

#[tokio::test]
async fn get_workspace_members_only() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let found = workspaces::get_workspace(&server, &alice, &ws).await.unwrap();
    assert_eq!(found.role, Role::Admin);
    assert_eq!(found.workspace.name, "w");

    let err = workspaces::get_workspace(&server, &UserId::new("stranger"), &ws)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let err = workspaces::get_workspace(&server, &alice, &WorkspaceId::generate())
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound(_)));
}

#[tokio::test]
async fn update_workspace_admin_only() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &bob, Role::ReadWrite, &alice).await;

    let err = workspaces::update_workspace(
        &server,
        &bob,
        &ws,
        UpdateWorkspaceParams {
            name: Some("hijack".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let err = workspaces::update_workspace(
        &server,
        &alice,
        &ws,
        UpdateWorkspaceParams {
            name: Some(" ".into()),
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CollabError::Validation(_)));

    let updated = workspaces::update_workspace(
        &server,
        &alice,
        &ws,
        UpdateWorkspaceParams {
            name: None,
            description: Some("new description".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "w");
    assert_eq!(updated.description, "new description");
}

#[tokio::test]
async fn update_settings_is_a_write_action() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let writer = UserId::new("writer");
    let reader = UserId::new("reader");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &writer, Role::ReadWrite, &alice).await;
    add_member_with_role(&server, &ws, &reader, Role::ReadOnly, &alice).await;

    let settings = workspaces::update_settings(
        &server,
        &writer,
        &ws,
        SettingsUpdate {
            allow_public_read: Some(true),
            require_approval: None,
        },
    )
    .await
    .unwrap();
    assert!(settings.allow_public_read);
    assert!(settings.require_approval);

    let err = workspaces::update_settings(
        &server,
        &reader,
        &ws,
        SettingsUpdate {
            allow_public_read: Some(false),
            require_approval: Some(false),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let stored = server.store.get_workspace(&ws).await.unwrap().settings;
    assert_eq!(stored, settings);
}

#[tokio::test]
async fn rotate_invitation_code_admin_only() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &bob, Role::ReadWrite, &alice).await;
    let before = server.store.get_workspace(&ws).await.unwrap().invitation_code;

    let err = workspaces::rotate_invitation_code(&server, &bob, &ws)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let code = workspaces::rotate_invitation_code(&server, &alice, &ws)
        .await
        .unwrap();
    assert_ne!(code, before);
    assert_eq!(
        server.store.get_workspace(&ws).await.unwrap().invitation_code,
        code
    );
}
