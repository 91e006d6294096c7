//! Caller identity, asserted by the trusted upstream identity provider.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use notespace_storage::UserId;

use crate::error::CollabError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, CollabError> {
        let user_id = header(headers, USER_ID_HEADER).ok_or(CollabError::Unauthenticated)?;
        Ok(Self {
            user_id: UserId(user_id),
            email: header(headers, USER_EMAIL_HEADER),
            name: header(headers, USER_NAME_HEADER),
        })
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = CollabError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
