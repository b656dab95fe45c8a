use std::collections::HashMap;

use uuid::Uuid;

use taskhub_core::model::{
    Comment, CommentWithUser, MemberWithUser, Project, ProjectMember, ProjectMemberWithUser,
    ProjectWithRelations, Task, TaskWithRelations, User, Workspace, WorkspaceMember,
    WorkspaceWithRelations,
};

/// Flat rows loaded for a workspace listing.
#[derive(Debug, Default)]
pub struct WorkspaceRows {
    pub workspaces: Vec<Workspace>,
    pub members: Vec<WorkspaceMember>,
    pub projects: Vec<Project>,
    pub project_members: Vec<ProjectMember>,
    pub tasks: Vec<Task>,
    pub comments: Vec<Comment>,
    pub users: Vec<User>,
}

/// Nest flat rows into workspace trees. Input order is preserved at every
/// level; rows whose parent is absent are dropped.
pub fn assemble_workspaces(rows: WorkspaceRows) -> Vec<WorkspaceWithRelations> {
    let users: HashMap<String, User> = rows.users.into_iter().map(|u| (u.id.clone(), u)).collect();
    let user = |id: &str| users.get(id).cloned();

    let mut comments_by_task: HashMap<Uuid, Vec<CommentWithUser>> = HashMap::new();
    for comment in rows.comments {
        let author = user(&comment.user_id);
        comments_by_task
            .entry(comment.task_id)
            .or_default()
            .push(CommentWithUser {
                comment,
                user: author,
            });
    }

    let mut tasks_by_project: HashMap<Uuid, Vec<TaskWithRelations>> = HashMap::new();
    for task in rows.tasks {
        let assignee = task.assignee_id.as_deref().and_then(user);
        let comments = comments_by_task.remove(&task.id).unwrap_or_default();
        tasks_by_project
            .entry(task.project_id)
            .or_default()
            .push(TaskWithRelations {
                task,
                assignee,
                comments,
            });
    }

    let mut project_members_by_project: HashMap<Uuid, Vec<ProjectMemberWithUser>> = HashMap::new();
    for member in rows.project_members {
        let u = user(&member.user_id);
        project_members_by_project
            .entry(member.project_id)
            .or_default()
            .push(ProjectMemberWithUser { member, user: u });
    }

    let mut projects_by_workspace: HashMap<String, Vec<ProjectWithRelations>> = HashMap::new();
    for project in rows.projects {
        let tasks = tasks_by_project.remove(&project.id).unwrap_or_default();
        let members = project_members_by_project
            .remove(&project.id)
            .unwrap_or_default();
        projects_by_workspace
            .entry(project.workspace_id.clone())
            .or_default()
            .push(ProjectWithRelations {
                project,
                tasks,
                members,
            });
    }

    let mut members_by_workspace: HashMap<String, Vec<MemberWithUser>> = HashMap::new();
    for member in rows.members {
        let u = user(&member.user_id);
        members_by_workspace
            .entry(member.workspace_id.clone())
            .or_default()
            .push(MemberWithUser { member, user: u });
    }

    rows.workspaces
        .into_iter()
        .map(|workspace| {
            let owner = user(&workspace.owner_id);
            WorkspaceWithRelations {
                members: members_by_workspace
                    .remove(&workspace.id)
                    .unwrap_or_default(),
                projects: projects_by_workspace
                    .remove(&workspace.id)
                    .unwrap_or_default(),
                owner,
                workspace,
            }
        })
        .collect()
}
