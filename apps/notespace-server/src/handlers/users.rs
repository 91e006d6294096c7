//! User handlers: profile sync

use notespace_storage::{StoreError, UpsertUserParams, UserProfile};
use tracing::info;

use crate::error::CollabError;
use crate::identity::Identity;
use crate::server::NotespaceServer;

/// Store or refresh the caller's profile. The first sync must carry an email.
pub async fn sync_user(
    server: &NotespaceServer,
    identity: &Identity,
) -> Result<UserProfile, CollabError> {
    let email = identity
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    if email.is_none() {
        match server.store.get_user(&identity.user_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => {
                return Err(CollabError::Validation(
                    "email is required on first sync".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }
    }

    let profile = server
        .store
        .upsert_user(&UpsertUserParams {
            user_id: identity.user_id.clone(),
            email: email.map(str::to_string),
            name: identity
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
        .await?;

    info!(user_id = %profile.user_id, "user profile synced");
    Ok(profile)
}
