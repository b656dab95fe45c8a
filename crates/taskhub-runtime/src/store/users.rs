use sqlx::PgPool;

use taskhub_core::error::{Result, TaskHubError};
use taskhub_core::model::{User, UserProfile};

const USER_COLUMNS: &str = "id, name, email, image, created_at, updated_at";

pub async fn find_user(pool: &PgPool, id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

    Ok(user)
}

pub async fn users_by_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let users =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(pool)
            .await?;

    Ok(users)
}

pub async fn insert_user(pool: &PgPool, profile: &UserProfile) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, name, email, image)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&profile.id)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(&profile.image)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_duplicate(e, format!("User '{}' already exists", profile.id)))?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(user)
}

pub async fn update_user(pool: &PgPool, profile: &UserProfile) -> Result<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET name = $2, email = $3, image = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&profile.id)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(&profile.image)
    .fetch_one(pool)
    .await
    .map_err(|e| TaskHubError::not_found_or(e, format!("User '{}'", profile.id)))?;

    tracing::info!(user_id = %user.id, "User updated");
    Ok(user)
}

pub async fn delete_user(pool: &PgPool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(TaskHubError::NotFound(format!("User '{}'", id)));
    }

    tracing::info!(user_id = %id, "User deleted");
    Ok(())
}

/// Turn a unique violation into `Conflict`, pass anything else through.
pub(crate) fn conflict_on_duplicate(err: sqlx::Error, message: String) -> TaskHubError {
    let err = TaskHubError::Sql(err);
    if err.is_unique_violation() {
        TaskHubError::Conflict(message)
    } else {
        err
    }
}
