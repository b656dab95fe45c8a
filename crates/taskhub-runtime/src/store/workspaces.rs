use std::collections::BTreeSet;

use sqlx::PgPool;
use uuid::Uuid;

use taskhub_core::error::{Result, TaskHubError};
use taskhub_core::model::{
    Comment, NewWorkspace, Project, ProjectMember, Task, Workspace, WorkspaceMember,
    WorkspaceWithRelations,
};

use super::tree::{assemble_workspaces, WorkspaceRows};
use super::users::{conflict_on_duplicate, users_by_ids};

const WORKSPACE_COLUMNS: &str =
    "id, name, slug, description, settings, owner_id, image_url, created_at, updated_at";

/// Mutable organization fields.
#[derive(Debug, Clone)]
pub struct WorkspaceUpdate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub image_url: &'a str,
}

pub async fn find_workspace(pool: &PgPool, id: &str) -> Result<Option<Workspace>> {
    let workspace = sqlx::query_as::<_, Workspace>(&format!(
        "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(workspace)
}

pub async fn insert_workspace(pool: &PgPool, new: &NewWorkspace) -> Result<Workspace> {
    let workspace = sqlx::query_as::<_, Workspace>(&format!(
        r#"
        INSERT INTO workspaces (id, name, slug, owner_id, image_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {WORKSPACE_COLUMNS}
        "#
    ))
    .bind(&new.id)
    .bind(&new.name)
    .bind(&new.slug)
    .bind(&new.owner_id)
    .bind(&new.image_url)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_duplicate(e, format!("Workspace '{}' already exists", new.id)))?;

    tracing::info!(workspace_id = %workspace.id, owner_id = %workspace.owner_id, "Workspace created");
    Ok(workspace)
}

pub async fn update_workspace(pool: &PgPool, id: &str, update: WorkspaceUpdate<'_>) -> Result<Workspace> {
    let workspace = sqlx::query_as::<_, Workspace>(&format!(
        r#"
        UPDATE workspaces
        SET name = $2, slug = $3, image_url = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING {WORKSPACE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(update.name)
    .bind(update.slug)
    .bind(update.image_url)
    .fetch_one(pool)
    .await
    .map_err(|e| TaskHubError::not_found_or(e, format!("Workspace '{}'", id)))?;

    tracing::info!(workspace_id = %workspace.id, "Workspace updated");
    Ok(workspace)
}

pub async fn delete_workspace(pool: &PgPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM workspaces WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(TaskHubError::NotFound(format!("Workspace '{}'", id)));
    }

    tracing::info!(workspace_id = %id, "Workspace deleted");
    Ok(())
}

/// Every workspace the user belongs to, with members, projects (tasks,
/// comments, project members) and owner resolved.
pub async fn workspaces_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<WorkspaceWithRelations>> {
    let workspaces = sqlx::query_as::<_, Workspace>(&format!(
        r#"
        SELECT {WORKSPACE_COLUMNS} FROM workspaces w
        WHERE EXISTS (
            SELECT 1 FROM workspace_members m
            WHERE m.workspace_id = w.id AND m.user_id = $1
        )
        ORDER BY w.created_at ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    if workspaces.is_empty() {
        return Ok(Vec::new());
    }

    let workspace_ids: Vec<String> = workspaces.iter().map(|w| w.id.clone()).collect();

    let members = sqlx::query_as::<_, WorkspaceMember>(
        "SELECT id, user_id, workspace_id, message, role FROM workspace_members WHERE workspace_id = ANY($1)",
    )
    .bind(&workspace_ids)
    .fetch_all(pool)
    .await?;

    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, name, description, priority, status, start_date, end_date, team_lead,
               workspace_id, progress, created_at, updated_at
        FROM projects WHERE workspace_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(&workspace_ids)
    .fetch_all(pool)
    .await?;

    let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();

    let project_members = sqlx::query_as::<_, ProjectMember>(
        "SELECT id, user_id, project_id FROM project_members WHERE project_id = ANY($1)",
    )
    .bind(&project_ids)
    .fetch_all(pool)
    .await?;

    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, title, description, status, type, priority, assignee_id,
               due_date, created_at, updated_at
        FROM tasks WHERE project_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(&project_ids)
    .fetch_all(pool)
    .await?;

    let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, content, user_id, task_id, created_at
        FROM comments WHERE task_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(&task_ids)
    .fetch_all(pool)
    .await?;

    let mut user_ids: BTreeSet<String> = BTreeSet::new();
    user_ids.extend(workspaces.iter().map(|w| w.owner_id.clone()));
    user_ids.extend(members.iter().map(|m| m.user_id.clone()));
    user_ids.extend(project_members.iter().map(|m| m.user_id.clone()));
    user_ids.extend(tasks.iter().filter_map(|t| t.assignee_id.clone()));
    user_ids.extend(comments.iter().map(|c| c.user_id.clone()));
    let user_ids: Vec<String> = user_ids.into_iter().collect();

    let users = users_by_ids(pool, &user_ids).await?;

    tracing::debug!(
        user_id = %user_id,
        workspaces = workspaces.len(),
        projects = projects.len(),
        tasks = tasks.len(),
        "Loaded workspace tree"
    );

    Ok(assemble_workspaces(WorkspaceRows {
        workspaces,
        members,
        projects,
        project_members,
        tasks,
        comments,
        users,
    }))
}
