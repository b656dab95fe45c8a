use super::runner::Migration;

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_taskhub_schema.sql");

/// Migrations shipped with the binary, in application order.
pub fn builtin_migrations() -> Vec<Migration> {
    vec![Migration::new("0001_taskhub_schema", SCHEMA_SQL)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_defines_all_tables() {
        let migrations = builtin_migrations();
        assert_eq!(migrations[0].name, "0001_taskhub_schema");

        let sql = &migrations[0].sql;
        for table in [
            "users",
            "workspaces",
            "workspace_members",
            "projects",
            "project_members",
            "tasks",
            "comments",
        ] {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_membership_is_unique_per_user_and_workspace() {
        let sql = &builtin_migrations()[0].sql;
        assert!(sql.contains("UNIQUE (user_id, workspace_id)"));
    }
}
