//! User profile types.

use chrono::{DateTime, Utc};

use super::UserId;

/// Local copy of a user's profile, as last reported by the identity provider.
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for inserting or refreshing a user profile.
/// `None` fields keep whatever is already stored.
#[derive(Clone, Debug)]
pub struct UpsertUserParams {
    pub user_id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
}
