//! Data model shared by the gateway, the sync functions and the store.
//!
//! Rows serialize with camelCase keys, except the handful of columns the
//! client has always seen in snake_case (`image_url`, `start_date`,
//! `end_date`, `team_lead`, `due_date`).

mod entities;
mod enums;
mod views;

pub use entities::{Comment, NewWorkspace, Project, ProjectMember, Task, User, UserProfile, Workspace, WorkspaceMember};
pub use enums::{MemberRole, Priority, ProjectStatus, TaskStatus, TaskType};
pub use views::{
    CommentWithUser, MemberWithUser, ProjectMemberWithUser, ProjectWithRelations,
    TaskWithRelations, WorkspaceWithRelations,
};
