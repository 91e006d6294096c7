//! Invitation token codec and invitation-code generation.
//!
//! A token is `<workspace id>-<invitation code>-<issued at, epoch millis>`. Workspace ids
//! are hyphenated UUIDs, so tokens are split from the right.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use notespace_storage::WorkspaceId;
use rand_core::{OsRng, RngCore};

use crate::error::CollabError;

pub const SEPARATOR: char = '-';

/// How long an issued token can be redeemed: seven days.
pub const INVITATION_TTL_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Random bytes behind an invitation code (rendered as uppercase hex).
const CODE_BYTES: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvitationToken {
    /// Raw workspace segment; only resolved against the registry at redemption.
    pub workspace: String,
    pub code: String,
    pub issued_at_millis: i64,
}

impl InvitationToken {
    pub fn issue(workspace_id: WorkspaceId, code: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            workspace: workspace_id.to_string(),
            code: code.to_string(),
            issued_at_millis: issued_at.timestamp_millis(),
        }
    }

    /// Strictly more than [`INVITATION_TTL_MILLIS`] since issuance.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis().saturating_sub(self.issued_at_millis) > INVITATION_TTL_MILLIS
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.issued_at_millis)
            .map(|t| t + Duration::milliseconds(INVITATION_TTL_MILLIS))
    }

    pub fn workspace_id(&self) -> Result<WorkspaceId, CollabError> {
        self.workspace
            .parse()
            .map_err(|_| CollabError::InvalidToken)
    }
}

impl fmt::Display for InvitationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.workspace, self.code, self.issued_at_millis
        )
    }
}

impl FromStr for InvitationToken {
    type Err = CollabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, SEPARATOR);
        let (Some(millis), Some(code), Some(workspace)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CollabError::InvalidToken);
        };
        if workspace.is_empty() || code.is_empty() {
            return Err(CollabError::InvalidToken);
        }
        let issued_at_millis = millis.parse().map_err(|_| CollabError::InvalidToken)?;

        Ok(Self {
            workspace: workspace.to_string(),
            code: code.to_string(),
            issued_at_millis,
        })
    }
}

/// Fresh uppercase invitation code from the OS RNG.
pub fn generate_invitation_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}
