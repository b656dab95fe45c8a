use thiserror::Error;

/// Core error type for TaskHub operations.
#[derive(Error, Debug)]
pub enum TaskHubError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TaskHubError {
    /// Whether the underlying database error is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            TaskHubError::Sql(sqlx::Error::Database(db)) => db.is_unique_violation(),
            TaskHubError::Conflict(_) => true,
            _ => false,
        }
    }

    /// Map `sqlx::Error::RowNotFound` to a domain `NotFound` with context.
    pub fn not_found_or(err: sqlx::Error, what: impl Into<String>) -> Self {
        match err {
            sqlx::Error::RowNotFound => TaskHubError::NotFound(what.into()),
            other => TaskHubError::Sql(other),
        }
    }
}

impl From<serde_json::Error> for TaskHubError {
    fn from(e: serde_json::Error) -> Self {
        TaskHubError::Serialization(e.to_string())
    }
}

/// Result type alias using TaskHubError.
pub type Result<T> = std::result::Result<T, TaskHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = TaskHubError::not_found_or(sqlx::Error::RowNotFound, "user user_123");
        assert!(matches!(err, TaskHubError::NotFound(ref m) if m == "user user_123"));
    }

    #[test]
    fn test_other_sql_errors_pass_through() {
        let err = TaskHubError::not_found_or(sqlx::Error::PoolTimedOut, "ignored");
        assert!(matches!(err, TaskHubError::Sql(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn test_conflict_counts_as_unique_violation() {
        assert!(TaskHubError::Conflict("dup".into()).is_unique_violation());
        assert!(!TaskHubError::NotFound("x".into()).is_unique_violation());
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: TaskHubError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
