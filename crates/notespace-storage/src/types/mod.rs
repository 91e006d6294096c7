//! Type definitions for notespace storage.

mod ids;
mod invitations;
mod memberships;
mod notes;
mod roles;
mod users;
mod workspaces;

// Re-export all types from submodules
pub use ids::*;
pub use invitations::*;
pub use memberships::*;
pub use notes::*;
pub use roles::*;
pub use users::*;
pub use workspaces::*;
