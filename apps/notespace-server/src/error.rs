//! Error taxonomy of the collaboration core and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notespace_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollabError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("user is already a member of this workspace")]
    AlreadyMember,

    #[error("invitation has expired")]
    Expired,

    #[error("invitation token is invalid")]
    InvalidToken,

    #[error("{0}")]
    Conflict(String),

    #[error("missing user identity")]
    Unauthenticated,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for CollabError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => CollabError::NotFound("not found".to_string()),
            StoreError::AlreadyExists => CollabError::Conflict("already exists".to_string()),
            other => CollabError::Internal(other.to_string()),
        }
    }
}

impl CollabError {
    /// Stable machine-readable name, used in response bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CollabError::Validation(_) => "validation",
            CollabError::NotFound(_) => "not_found",
            CollabError::Forbidden(_) => "forbidden",
            CollabError::AlreadyMember => "already_member",
            CollabError::Expired => "expired",
            CollabError::InvalidToken => "invalid_token",
            CollabError::Conflict(_) => "conflict",
            CollabError::Unauthenticated => "unauthenticated",
            CollabError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CollabError::Validation(_) | CollabError::InvalidToken => StatusCode::BAD_REQUEST,
            CollabError::Unauthenticated => StatusCode::UNAUTHORIZED,
            CollabError::Forbidden(_) => StatusCode::FORBIDDEN,
            CollabError::NotFound(_) => StatusCode::NOT_FOUND,
            CollabError::AlreadyMember | CollabError::Conflict(_) => StatusCode::CONFLICT,
            CollabError::Expired => StatusCode::GONE,
            CollabError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps a store lookup to a `NotFound` naming the missing entity; other errors convert as usual.
pub fn missing(what: &'static str) -> impl FnOnce(StoreError) -> CollabError {
    move |e| match e {
        StoreError::NotFound => CollabError::NotFound(format!("{what} not found")),
        other => other.into(),
    }
}

impl IntoResponse for CollabError {
    fn into_response(self) -> Response {
        let message = match &self {
            CollabError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });
        (self.status(), Json(body)).into_response()
    }
}
