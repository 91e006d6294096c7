//! Handler integration tests, one module per handler area.

mod invitations;
mod notes;
mod workspaces;
