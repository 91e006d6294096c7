//! Shared note handler tests.

use super::super::common::*;
use crate::error::CollabError;
use crate::handlers::notes::{self, NoteUpdate, UNTITLED_NOTE};
use notespace_storage::*;

#[tokio::test]
async fn every_role_reads_only_writers_write() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let writer = UserId::new("writer");
    let reader = UserId::new("reader");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &writer, Role::ReadWrite, &alice).await;
    add_member_with_role(&server, &ws, &reader, Role::ReadOnly, &alice).await;

    let by_admin = notes::create_note(&server, &ws, &alice, "A", "a")
        .await
        .unwrap();
    let by_writer = notes::create_note(&server, &ws, &writer, "W", "w")
        .await
        .unwrap();

    for user in [&alice, &writer, &reader] {
        assert_eq!(
            notes::list_notes(&server, &ws, user).await.unwrap().len(),
            2
        );
    }

    let err = notes::create_note(&server, &ws, &reader, "R", "r")
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let err = notes::update_note(
        &server,
        &ws,
        &by_admin.id,
        &reader,
        NoteUpdate {
            title: Some("x".into()),
            content: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let err = notes::delete_note(&server, &ws, &by_writer.id, &reader)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));
    assert_eq!(server.store.list_notes(&ws).await.unwrap().len(), 2);
}

#[tokio::test]
async fn blank_title_gets_placeholder() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let note = notes::create_note(&server, &ws, &alice, "  ", "body")
        .await
        .unwrap();
    assert_eq!(note.title, UNTITLED_NOTE);
    assert_eq!(note.title, "Untitled Note");
}

#[tokio::test]
async fn titles_are_stored_as_given() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let note = notes::create_note(&server, &ws, &alice, " Draft ", "body")
        .await
        .unwrap();
    assert_eq!(note.title, " Draft ");

    let updated = notes::update_note(
        &server,
        &ws,
        &note.id,
        &alice,
        NoteUpdate {
            title: Some(String::new()),
            content: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "");
    assert_eq!(updated.content, "body");
}

#[tokio::test]
async fn update_is_partial_and_tracks_editor() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &bob, Role::ReadWrite, &alice).await;

    let note = notes::create_note(&server, &ws, &alice, "Draft", "hello")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;

    let updated = notes::update_note(
        &server,
        &ws,
        &note.id,
        &bob,
        NoteUpdate {
            title: None,
            content: Some("hello world".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.title, "Draft");
    assert_eq!(updated.content, "hello world");
    assert_eq!(updated.created_by, alice);
    assert_eq!(updated.last_edited_by, bob);
    assert!(updated.updated_at > note.updated_at);
    assert_eq!(updated.created_at, note.created_at);
}

#[tokio::test]
async fn missing_notes_are_not_found() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let ghost = NoteId::generate();

    let err = notes::update_note(&server, &ws, &ghost, &alice, NoteUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound(_)));

    let err = notes::delete_note(&server, &ws, &ghost, &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound(_)));
}

#[tokio::test]
async fn notes_from_another_workspace_are_not_found() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws_a = create_test_workspace(&server, &alice, "a").await;
    let ws_b = create_test_workspace(&server, &alice, "b").await;

    let note = notes::create_note(&server, &ws_a, &alice, "A only", "")
        .await
        .unwrap();

    let err = notes::delete_note(&server, &ws_b, &note.id, &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound(_)));
    assert!(notes::list_notes(&server, &ws_b, &alice)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn list_orders_by_last_update() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let older = notes::create_note(&server, &ws, &alice, "older", "")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    notes::create_note(&server, &ws, &alice, "newer", "")
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    notes::update_note(
        &server,
        &ws,
        &older.id,
        &alice,
        NoteUpdate {
            title: Some("older, edited".into()),
            content: None,
        },
    )
    .await
    .unwrap();

    let titles: Vec<String> = notes::list_notes(&server, &ws, &alice)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["older, edited", "newer"]);
}
