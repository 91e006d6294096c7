//! Collaboration operations, independent of transport.
//!
//! Every handler takes the server and the already-authenticated caller, consults the
//! authorization gate before mutating anything, and returns storage types or a
//! [`CollabError`](crate::error::CollabError):
//! - users: profile sync
//! - workspaces: create, list, get, update, settings, invitation-code rotation
//! - invitations: generate, redeem, list, revoke
//! - members: list, change role, remove
//! - notes: create, update, delete, list

pub mod invitations;
pub mod members;
pub mod notes;
pub mod users;
pub mod workspaces;
