//! Invitation handler tests.

use chrono::{Duration, Utc};

use super::super::common::*;
use crate::error::CollabError;
use crate::handlers::invitations::{self, redeem_invitation_at};
use crate::handlers::workspaces;
use crate::token::{InvitationToken, INVITATION_TTL_MILLIS};
use notespace_storage::*;

#[tokio::test]
async fn handler_generate_invitation() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let code = server.store.get_workspace(&ws).await.unwrap().invitation_code;

    let invite = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();

    assert_eq!(invite.invitation_code, code);
    assert!(invite.token.starts_with(&format!("{ws}-{code}-")));
    assert_eq!(
        invite.invitation_link,
        format!("http://localhost:3000/join/{}", invite.token)
    );
    assert!(invite.expires_at.unwrap() > Utc::now() + Duration::days(6));

    let recorded = server.store.get_invitation(&invite.token).await.unwrap();
    assert_eq!(recorded.issued_by, alice);
    assert!(!recorded.revoked);
}

#[tokio::test]
async fn generate_invitation_requires_admin() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &bob, Role::ReadWrite, &alice).await;

    let err = invitations::generate_invitation(&server, &bob, &ws)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));

    let err = invitations::generate_invitation(&server, &alice, &WorkspaceId::generate())
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound(_)));
}

#[tokio::test]
async fn redeem_grants_read_write_invited_by_creator() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;

    let invite = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    let joined = invitations::redeem_invitation(&server, &bob, &invite.token)
        .await
        .unwrap();

    assert_eq!(joined.workspace.id, ws);
    assert_eq!(joined.membership.role, Role::ReadWrite);
    assert_eq!(joined.membership.invited_by, alice);
    assert_eq!(role_of(&server, &ws, &bob).await, Some(Role::ReadWrite));
}

#[tokio::test]
async fn redeem_twice_is_already_member_with_one_row() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;
    let invite = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();

    invitations::redeem_invitation(&server, &bob, &invite.token)
        .await
        .unwrap();
    let err = invitations::redeem_invitation(&server, &bob, &invite.token)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::AlreadyMember));

    let members = server.store.list_members(&ws).await.unwrap();
    let bobs = members
        .iter()
        .filter(|m| m.membership.user_id == bob)
        .count();
    assert_eq!(bobs, 1);
}

#[tokio::test]
async fn existing_admin_redeeming_keeps_admin_role() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let invite = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();

    let err = invitations::redeem_invitation(&server, &alice, &invite.token)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::AlreadyMember));
    assert_eq!(role_of(&server, &ws, &alice).await, Some(Role::Admin));
}

#[tokio::test]
async fn token_is_not_single_use_across_users() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let invite = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();

    for user in ["bob", "carol"] {
        let joined = invitations::redeem_invitation(&server, &UserId::new(user), &invite.token)
            .await
            .unwrap();
        assert_eq!(joined.membership.role, Role::ReadWrite);
    }
    assert_eq!(server.store.list_members(&ws).await.unwrap().len(), 3);
}

#[tokio::test]
async fn expired_regardless_of_secret() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let code = server.store.get_workspace(&ws).await.unwrap().invitation_code;
    let issued = Utc::now() - Duration::days(8);

    let valid_secret = InvitationToken::issue(ws, &code, issued).to_string();
    let wrong_secret = InvitationToken::issue(ws, "NOTTHECODE", issued).to_string();
    let unknown_ws = InvitationToken::issue(WorkspaceId::generate(), &code, issued).to_string();

    for token in [valid_secret, wrong_secret, unknown_ws] {
        let err = invitations::redeem_invitation(&server, &UserId::new("bob"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::Expired), "{token}");
    }
    assert_eq!(role_of(&server, &ws, &UserId::new("bob")).await, None);
}

#[tokio::test]
async fn expiry_boundary_at_redemption() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let invite = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    let token: InvitationToken = invite.token.parse().unwrap();
    let issued = chrono::DateTime::from_timestamp_millis(token.issued_at_millis).unwrap();
    let ttl = Duration::milliseconds(INVITATION_TTL_MILLIS);

    let err = redeem_invitation_at(
        &server,
        &UserId::new("late"),
        &invite.token,
        issued + ttl + Duration::milliseconds(1),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CollabError::Expired));

    redeem_invitation_at(
        &server,
        &UserId::new("just-in-time"),
        &invite.token,
        issued + ttl,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn rotation_invalidates_earlier_tokens() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let first = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    let second = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    workspaces::rotate_invitation_code(&server, &alice, &ws)
        .await
        .unwrap();

    for token in [&first.token, &second.token] {
        let err = invitations::redeem_invitation(&server, &UserId::new("bob"), token)
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::InvalidToken));
    }

    let fresh = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    invitations::redeem_invitation(&server, &UserId::new("bob"), &fresh.token)
        .await
        .unwrap();
}

#[tokio::test]
async fn malformed_or_forged_tokens_are_invalid() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;
    let now = Utc::now().timestamp_millis();

    for token in [
        "garbage".to_string(),
        format!("{ws}-WRONGCODE-{now}"),
        format!("not-a-workspace-CODE-{now}"),
        format!("{}-CODE-{now}", WorkspaceId::generate()),
    ] {
        let err = invitations::redeem_invitation(&server, &UserId::new("bob"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::InvalidToken), "{token}");
    }
}

#[tokio::test]
async fn revoked_invitation_is_invalid_others_still_work() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let revoked = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    // Distinct issue millis so the two tokens differ.
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    let kept = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    assert_ne!(revoked.token, kept.token);

    invitations::revoke_invitation(&server, &alice, &ws, &revoked.token)
        .await
        .unwrap();

    let err = invitations::redeem_invitation(&server, &UserId::new("bob"), &revoked.token)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::InvalidToken));
    invitations::redeem_invitation(&server, &UserId::new("bob"), &kept.token)
        .await
        .unwrap();
}

#[tokio::test]
async fn list_invitations_shows_only_outstanding() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let bob = UserId::new("bob");
    let ws = create_test_workspace(&server, &alice, "w").await;
    add_member_with_role(&server, &ws, &bob, Role::ReadWrite, &alice).await;

    let stale = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    workspaces::rotate_invitation_code(&server, &alice, &ws)
        .await
        .unwrap();
    let live = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    let revoked = invitations::generate_invitation(&server, &alice, &ws)
        .await
        .unwrap();
    invitations::revoke_invitation(&server, &alice, &ws, &revoked.token)
        .await
        .unwrap();

    let listed: Vec<String> = invitations::list_invitations(&server, &alice, &ws)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.token)
        .collect();
    assert_eq!(listed, vec![live.token]);
    assert!(!listed.contains(&stale.token));

    let err = invitations::list_invitations(&server, &bob, &ws)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden(_)));
}

#[tokio::test]
async fn revoke_unknown_invitation_is_not_found() {
    let server = create_test_server().await;
    let alice = create_test_user(&server, "alice").await;
    let ws = create_test_workspace(&server, &alice, "w").await;

    let err = invitations::revoke_invitation(&server, &alice, &ws, "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound(_)));
}
