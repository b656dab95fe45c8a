use sqlx::PgPool;
use uuid::Uuid;

use taskhub_core::error::Result;
use taskhub_core::model::{MemberRole, WorkspaceMember};

use super::users::conflict_on_duplicate;

const MEMBER_COLUMNS: &str = "id, user_id, workspace_id, message, role";

/// Fields of a membership to create.
#[derive(Debug, Clone)]
pub struct NewMember<'a> {
    pub user_id: &'a str,
    pub workspace_id: &'a str,
    pub role: MemberRole,
    pub message: &'a str,
}

pub async fn members_of_workspace(pool: &PgPool, workspace_id: &str) -> Result<Vec<WorkspaceMember>> {
    let members = sqlx::query_as::<_, WorkspaceMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM workspace_members WHERE workspace_id = $1"
    ))
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Insert a membership. A second row for the same (user, workspace) is a
/// `Conflict`.
pub async fn insert_member(pool: &PgPool, member: NewMember<'_>) -> Result<WorkspaceMember> {
    let created = sqlx::query_as::<_, WorkspaceMember>(&format!(
        r#"
        INSERT INTO workspace_members (id, user_id, workspace_id, role, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {MEMBER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(member.user_id)
    .bind(member.workspace_id)
    .bind(member.role)
    .bind(member.message)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        conflict_on_duplicate(
            e,
            format!(
                "User '{}' is already a member of '{}'",
                member.user_id, member.workspace_id
            ),
        )
    })?;

    tracing::info!(
        user_id = %created.user_id,
        workspace_id = %created.workspace_id,
        role = %created.role,
        "Workspace member created"
    );
    Ok(created)
}
