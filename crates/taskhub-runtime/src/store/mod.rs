//! SQL access for every table the service touches.
//!
//! Functions take a `&PgPool` and return domain rows; missing rows on
//! update/delete surface as `TaskHubError::NotFound`, duplicate memberships as
//! `TaskHubError::Conflict`.

mod members;
mod tree;
mod users;
mod workspaces;

pub use members::{insert_member, members_of_workspace, NewMember};
pub use tree::{assemble_workspaces, WorkspaceRows};
pub use users::{delete_user, find_user, find_user_by_email, insert_user, update_user, users_by_ids};
pub use workspaces::{
    delete_workspace, find_workspace, insert_workspace, update_workspace, workspaces_for_user,
    WorkspaceUpdate,
};
