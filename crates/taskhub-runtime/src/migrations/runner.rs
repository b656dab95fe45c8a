use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Acquire, PgPool, Postgres};
use tracing::{debug, info, warn};

use taskhub_core::error::{Result, TaskHubError};

/// Advisory lock key held while migrating ("TSKHUB" in ASCII).
const MIGRATION_LOCK_ID: i64 = 0x54534B485542;

/// A named SQL script.
#[derive(Debug, Clone)]
pub struct Migration {
    pub name: String,
    pub sql: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Whether a known migration has been applied.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Applies built-in and user migrations.
pub struct MigrationRunner {
    pool: PgPool,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply every pending migration.
    ///
    /// The advisory lock is session scoped, so the lock, the migrations and
    /// the unlock all run on one dedicated connection.
    pub async fn run(&self, user_migrations: Vec<Migration>) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire().await?;

        debug!("Acquiring migration lock");
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&mut *conn)
            .await
            .map_err(|e| TaskHubError::Database(format!("Failed to acquire migration lock: {}", e)))?;

        let result = Self::apply_pending(&mut conn, user_migrations).await;

        if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_ID)
            .execute(&mut *conn)
            .await
        {
            warn!("Failed to release migration lock: {}", e);
        }

        result
    }

    async fn apply_pending(
        conn: &mut PoolConnection<Postgres>,
        user_migrations: Vec<Migration>,
    ) -> Result<Vec<String>> {
        ensure_migrations_table(conn).await?;
        let applied = applied_migrations(conn).await?;

        let mut newly_applied = Vec::new();
        for migration in super::builtin::builtin_migrations()
            .into_iter()
            .chain(user_migrations)
        {
            if applied.contains_key(&migration.name) {
                continue;
            }
            apply_migration(conn, &migration).await?;
            newly_applied.push(migration.name);
        }

        if newly_applied.is_empty() {
            debug!("Schema is up to date");
        }
        Ok(newly_applied)
    }

    /// Applied/pending state of built-in plus the given user migrations.
    pub async fn status(&self, user_migrations: &[Migration]) -> Result<Vec<MigrationStatus>> {
        let mut conn = self.pool.acquire().await?;
        ensure_migrations_table(&mut conn).await?;
        let applied = applied_migrations(&mut conn).await?;

        let builtin = super::builtin::builtin_migrations();
        Ok(builtin
            .iter()
            .chain(user_migrations.iter())
            .map(|m| MigrationStatus {
                name: m.name.clone(),
                applied_at: applied.get(&m.name).copied(),
            })
            .collect())
    }
}

async fn ensure_migrations_table(conn: &mut PoolConnection<Postgres>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS taskhub_migrations (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) UNIQUE NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut **conn)
    .await
    .map_err(|e| TaskHubError::Database(format!("Failed to create migrations table: {}", e)))?;
    Ok(())
}

async fn applied_migrations(
    conn: &mut PoolConnection<Postgres>,
) -> Result<HashMap<String, DateTime<Utc>>> {
    let rows: Vec<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT name, applied_at FROM taskhub_migrations")
            .fetch_all(&mut **conn)
            .await
            .map_err(|e| {
                TaskHubError::Database(format!("Failed to read applied migrations: {}", e))
            })?;

    Ok(rows.into_iter().collect())
}

/// Run one migration and record it, atomically.
async fn apply_migration(conn: &mut PoolConnection<Postgres>, migration: &Migration) -> Result<()> {
    info!(migration = %migration.name, "Applying migration");

    let mut tx = conn.begin().await?;

    for statement in split_sql_statements(&migration.sql) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                TaskHubError::Database(format!(
                    "Failed to apply migration '{}': {}",
                    migration.name, e
                ))
            })?;
    }

    sqlx::query("INSERT INTO taskhub_migrations (name) VALUES ($1)")
        .bind(&migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(migration = %migration.name, "Migration applied");
    Ok(())
}

/// Split a script on top-level semicolons.
///
/// Semicolons inside single-quoted literals, `--` comments and dollar-quoted
/// bodies (`$$ ... $$`, `$tag$ ... $tag$`) do not terminate a statement.
/// Comment-only fragments are dropped.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut dollar_tag: Option<String> = None;
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(tag) = &dollar_tag {
            if c == '$' && starts_with_at(&chars, i, tag) {
                current.push_str(tag);
                i += tag.chars().count();
                dollar_tag = None;
                continue;
            }
            current.push(c);
            i += 1;
            continue;
        }

        if in_string {
            current.push(c);
            if c == '\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' => {
                in_string = true;
                current.push(c);
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '$' => {
                if let Some(tag) = read_dollar_tag(&chars, i) {
                    current.push_str(&tag);
                    i += tag.chars().count();
                    dollar_tag = Some(tag);
                    continue;
                }
                current.push(c);
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
        i += 1;
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

fn starts_with_at(chars: &[char], at: usize, needle: &str) -> bool {
    needle
        .chars()
        .enumerate()
        .all(|(offset, n)| chars.get(at + offset) == Some(&n))
}

/// Read a `$tag$` opener starting at `at`, if there is one.
fn read_dollar_tag(chars: &[char], at: usize) -> Option<String> {
    let mut tag = String::from("$");
    let mut i = at + 1;
    while let Some(&c) = chars.get(i) {
        if c == '$' {
            tag.push('$');
            return Some(tag);
        }
        if c.is_alphanumeric() || c == '_' {
            tag.push(c);
            i += 1;
        } else {
            return None;
        }
    }
    None
}

/// Load user migrations from a directory of `NNNN_name.sql` files, sorted by
/// name. A missing directory yields no migrations.
pub fn load_migrations_from_dir(dir: &Path) -> Result<Vec<Migration>> {
    if !dir.exists() {
        debug!("Migrations directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut migrations = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().map(|e| e == "sql").unwrap_or(false) {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| TaskHubError::Config("Invalid migration filename".into()))?
                .to_string();

            let sql = std::fs::read_to_string(&path)?;
            migrations.push(Migration::new(name, sql));
        }
    }

    migrations.sort_by(|a, b| a.name.cmp(&b.name));

    debug!("Loaded {} user migrations", migrations.len());
    Ok(migrations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_migrations_from_nonexistent_dir() {
        let migrations = load_migrations_from_dir(Path::new("/nonexistent/path")).unwrap();
        assert!(migrations.is_empty());
    }

    #[test]
    fn test_load_migrations_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("0003_third.sql"), "SELECT 3;").unwrap();
        fs::write(dir.path().join("0002_second.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a migration").unwrap();
        fs::write(dir.path().join("0004_old.sql.bak"), "SELECT 4;").unwrap();

        let migrations = load_migrations_from_dir(dir.path()).unwrap();
        let names: Vec<_> = migrations.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["0002_second", "0003_third"]);
    }

    #[test]
    fn test_split_simple_statements() {
        let stmts = split_sql_statements("SELECT 1; SELECT 2;\nSELECT 3");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_split_keeps_do_block_intact() {
        let sql = r#"
DO $$ BEGIN
    CREATE TYPE workspace_role AS ENUM ('ADMIN', 'MEMBER');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE t (id INT);
"#;
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("DO $$ BEGIN"));
        assert!(stmts[0].ends_with("END $$"));
        assert_eq!(stmts[1], "CREATE TABLE t (id INT)");
    }

    #[test]
    fn test_split_handles_tagged_dollar_quotes() {
        let sql = "CREATE FUNCTION f() RETURNS int AS $body$ SELECT 1; $body$ LANGUAGE sql; SELECT 2;";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("SELECT 1; $body$"));
    }

    #[test]
    fn test_split_ignores_semicolons_in_strings_and_comments() {
        let sql = "-- setup; not a statement\nINSERT INTO t VALUES ('a;b');\n-- trailing comment";
        let stmts = split_sql_statements(sql);
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('a;b')"]);
    }

    #[test]
    fn test_embedded_schema_splits_cleanly() {
        let schema = &crate::migrations::builtin_migrations()[0].sql;
        let stmts = split_sql_statements(schema);
        assert!(stmts.iter().all(|s| !s.starts_with("--")));
        assert_eq!(
            stmts.iter().filter(|s| s.starts_with("CREATE TABLE")).count(),
            7
        );
    }
}
