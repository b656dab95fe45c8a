//! Process wiring: database, migrations, sync registry and HTTP gateway.

use std::path::PathBuf;

use tokio::sync::broadcast;

use taskhub_core::config::TaskHubConfig;
use taskhub_core::error::{Result, TaskHubError};
use taskhub_runtime::db::Database;
use taskhub_runtime::gateway::{AppState, AuthMiddleware, GatewayServer};
use taskhub_runtime::migrations::{load_migrations_from_dir, Migration, MigrationRunner};
use taskhub_runtime::sync::{SyncFunction, SyncRegistry};

/// The TaskHub service.
pub struct TaskHub {
    config: TaskHubConfig,
    sync_registry: SyncRegistry,
    migrations_dir: PathBuf,
    extra_migrations: Vec<Migration>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TaskHub {
    pub fn builder() -> TaskHubBuilder {
        TaskHubBuilder::new()
    }

    pub fn config(&self) -> &TaskHubConfig {
        &self.config
    }

    pub fn sync_registry(&self) -> &SyncRegistry {
        &self.sync_registry
    }

    /// Handle that stops a running service when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Connect, migrate and serve until Ctrl-C, SIGTERM or [`TaskHub::shutdown`].
    pub async fn run(self) -> Result<()> {
        tracing::info!("TaskHub starting");

        let db = Database::from_config(&self.config.database).await?;
        tracing::info!("Connected to database");

        let mut user_migrations = load_migrations_from_dir(&self.migrations_dir)?;
        user_migrations.extend(self.extra_migrations);
        let applied = MigrationRunner::new(db.pool().clone())
            .run(user_migrations)
            .await?;
        tracing::info!(applied = applied.len(), "Migrations completed");

        let auth = AuthMiddleware::new(self.config.auth.clone())?;
        if self.config.auth.skip_verification {
            tracing::warn!("Token signature verification is disabled");
        }
        if self.config.sync.signing_key.is_none() {
            tracing::warn!("sync.signing_key is not set; /api/inngest accepts unsigned requests");
        }

        tracing::info!(functions = self.sync_registry.len(), "Sync functions registered");

        let state = AppState::new(db.clone(), self.sync_registry, self.config.sync.clone());
        let gateway = GatewayServer::new(self.config.gateway.clone(), auth, state);

        let shutdown_rx = self.shutdown_tx.subscribe();
        let served = gateway.run(shutdown_signal(shutdown_rx)).await;

        tracing::info!("Closing database connections");
        db.close().await;

        served.map_err(TaskHubError::Io)?;
        tracing::info!("TaskHub stopped");
        Ok(())
    }

    /// Request shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn shutdown_signal(mut shutdown_rx: broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
        _ = shutdown_rx.recv() => tracing::info!("Received shutdown notification"),
    }
}

/// Builder for [`TaskHub`].
pub struct TaskHubBuilder {
    config: Option<TaskHubConfig>,
    sync_registry: SyncRegistry,
    migrations_dir: PathBuf,
    extra_migrations: Vec<Migration>,
}

impl TaskHubBuilder {
    /// Builder with the built-in sync functions registered.
    pub fn new() -> Self {
        Self {
            config: None,
            sync_registry: SyncRegistry::with_builtin_functions(),
            migrations_dir: PathBuf::from("migrations"),
            extra_migrations: Vec::new(),
        }
    }

    pub fn config(mut self, config: TaskHubConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Directory of `NNNN_name.sql` files applied after the built-in schema.
    pub fn migrations_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.migrations_dir = path.into();
        self
    }

    pub fn migration(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.extra_migrations.push(Migration::new(name, sql));
        self
    }

    /// Register an additional sync function.
    pub fn sync_function<F: SyncFunction>(mut self) -> Self {
        self.sync_registry.register::<F>();
        self
    }

    pub fn build(self) -> Result<TaskHub> {
        let config = self
            .config
            .ok_or_else(|| TaskHubError::Config("Configuration is required".into()))?;
        config.validate()?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(TaskHub {
            config,
            sync_registry: self.sync_registry,
            migrations_dir: self.migrations_dir,
            extra_migrations: self.extra_migrations,
            shutdown_tx,
        })
    }
}

impl Default for TaskHubBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_config() {
        let result = TaskHub::builder().build();
        assert!(matches!(result, Err(TaskHubError::Config(_))));
    }

    #[test]
    fn test_build_validates_config() {
        let result = TaskHub::builder()
            .config(TaskHubConfig::default_with_database_url(""))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_registers_builtin_functions() {
        let hub = TaskHub::builder()
            .config(TaskHubConfig::default_with_database_url(
                "postgres://localhost/taskhub",
            ))
            .migrations_dir("db/migrations")
            .migration("0100_extra", "SELECT 1")
            .build()
            .unwrap();

        assert_eq!(hub.sync_registry().len(), 7);
        assert_eq!(hub.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(hub.extra_migrations.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_notifies_subscribers() {
        let hub = TaskHub::builder()
            .config(TaskHubConfig::default_with_database_url(
                "postgres://localhost/taskhub",
            ))
            .build()
            .unwrap();

        let mut rx = hub.shutdown_handle().subscribe();
        hub.shutdown();
        assert!(rx.recv().await.is_ok());
    }
}
