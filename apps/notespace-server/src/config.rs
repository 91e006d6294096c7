//! Server configuration.
//!
//! Supports configuration via environment variables:
//!
//! ```bash
//! # Base URL invitation links are built on (no trailing slash needed)
//! NOTESPACE_PUBLIC_URL=https://notes.example.com
//!
//! # Path of the join page, the token is appended as the final segment
//! NOTESPACE_INVITE_PATH=/join
//! ```

use std::env;
use thiserror::Error;

pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_INVITE_PATH: &str = "/join";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Public base URL, without trailing slash
    pub public_url: String,
    /// Join page path, starting with `/` and without trailing slash
    pub invite_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            invite_path: DEFAULT_INVITE_PATH.to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid public URL: {0}. Expected an http:// or https:// URL")]
    InvalidPublicUrl(String),

    #[error("Invalid invite path: {0}. Expected a path starting with '/'")]
    InvalidInvitePath(String),
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let public_url = match env::var("NOTESPACE_PUBLIC_URL") {
            Ok(url) => {
                let trimmed = url.trim().trim_end_matches('/');
                let has_host = trimmed
                    .strip_prefix("https://")
                    .or_else(|| trimmed.strip_prefix("http://"))
                    .is_some_and(|rest| !rest.is_empty());
                if !has_host {
                    return Err(ConfigError::InvalidPublicUrl(url));
                }
                trimmed.to_string()
            }
            Err(_) => DEFAULT_PUBLIC_URL.to_string(),
        };

        let invite_path = match env::var("NOTESPACE_INVITE_PATH") {
            Ok(path) => {
                let trimmed = path.trim();
                if !trimmed.starts_with('/') {
                    return Err(ConfigError::InvalidInvitePath(path));
                }
                trimmed.trim_end_matches('/').to_string()
            }
            Err(_) => DEFAULT_INVITE_PATH.to_string(),
        };

        Ok(Self {
            public_url,
            invite_path,
        })
    }

    /// Link whose final path segment is the token.
    pub fn invitation_link(&self, token: &str) -> String {
        format!("{}{}/{}", self.public_url, self.invite_path, token)
    }
}
