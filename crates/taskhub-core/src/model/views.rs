//! Nested read models returned by the workspace listing.

use serde::{Deserialize, Serialize};

use super::entities::{Comment, Project, ProjectMember, Task, User, Workspace, WorkspaceMember};

/// A workspace with its members, projects and owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceWithRelations {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub members: Vec<MemberWithUser>,
    pub projects: Vec<ProjectWithRelations>,
    pub owner: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: WorkspaceMember,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithRelations {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<TaskWithRelations>,
    pub members: Vec<ProjectMemberWithUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMemberWithUser {
    #[serde(flatten)]
    pub member: ProjectMember,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithRelations {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<User>,
    pub comments: Vec<CommentWithUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberRole;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_member_with_user_flattens() {
        let view = MemberWithUser {
            member: WorkspaceMember {
                id: Uuid::nil(),
                user_id: "user_1".into(),
                workspace_id: "org_1".into(),
                message: String::new(),
                role: MemberRole::Admin,
            },
            user: Some(User {
                id: "user_1".into(),
                name: "Ada Lovelace".into(),
                email: Some("ada@example.com".into()),
                image: String::new(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }),
        };

        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["workspaceId"], "org_1");
        assert_eq!(json["user"]["email"], "ada@example.com");
    }
}
