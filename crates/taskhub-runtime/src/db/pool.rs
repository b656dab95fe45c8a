use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;

use taskhub_core::config::DatabaseConfig;
use taskhub_core::error::{Result, TaskHubError};

/// Database connection wrapper around a single pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using the given configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| TaskHubError::Database(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// Build a pool that connects on first use. Used by tests and by callers
    /// that want startup to succeed while the database is still coming up.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config)
            .connect_lazy(&config.url)
            .map_err(|e| TaskHubError::Database(format!("Invalid database URL: {}", e)))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        let statement_timeout_ms = config.statement_timeout().map(|t| t.as_millis());

        PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout())
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if let Some(ms) = statement_timeout_ms {
                        conn.execute(format!("SET statement_timeout = {}", ms).as_str())
                            .await?;
                    }
                    Ok(())
                })
            })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| TaskHubError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_lazy_does_not_touch_network() {
        let config = DatabaseConfig {
            url: "postgres://localhost:1/nonexistent".to_string(),
            pool_size: 1,
            ..Default::default()
        };

        let db = Database::connect_lazy(&config).unwrap();
        assert_eq!(db.pool().size(), 0);
    }

    #[tokio::test]
    async fn test_connect_lazy_rejects_garbage_url() {
        let config = DatabaseConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };

        assert!(Database::connect_lazy(&config).is_err());
    }
}
