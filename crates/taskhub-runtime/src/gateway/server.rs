use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use taskhub_core::config::{GatewayConfig, SyncConfig};

use super::auth::{auth_middleware, require_auth, AuthMiddleware};
use super::inngest::{introspect, invoke};
use super::tracing::tracing_middleware;
use super::workspaces::{add_member, get_user_workspaces};
use crate::db::Database;
use crate::sync::SyncRegistry;

/// Shared state for every handler.
pub struct AppState {
    db: Database,
    registry: Arc<SyncRegistry>,
    sync: SyncConfig,
}

impl AppState {
    pub fn new(db: Database, registry: SyncRegistry, sync: SyncConfig) -> Self {
        Self {
            db,
            registry: Arc::new(registry),
            sync,
        }
    }

    pub fn db(&self) -> &PgPool {
        self.db.pool()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn registry(&self) -> &SyncRegistry {
        &self.registry
    }

    pub fn sync_config(&self) -> &SyncConfig {
        &self.sync
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// HTTP gateway.
pub struct GatewayServer {
    config: GatewayConfig,
    auth: Arc<AuthMiddleware>,
    state: Arc<AppState>,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, auth: AuthMiddleware, state: AppState) -> Self {
        Self {
            config,
            auth: Arc::new(auth),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    fn cors(&self) -> CorsLayer {
        if self.config.cors_origins.iter().any(|o| o == "*") {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<HeaderValue> = self
                .config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let workspaces = Router::new()
            .route("/api/workspaces", get(get_user_workspaces))
            .route("/api/workspaces/add-member", post(add_member))
            .route_layer(middleware::from_fn(require_auth));

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/api/inngest", get(introspect).post(invoke))
            .merge(workspaces)
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(tracing_middleware))
                    .layer(self.cors())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        self.config.request_timeout_secs,
                    )))
                    .layer(DefaultBodyLimit::max(self.config.body_limit_bytes))
                    .layer(middleware::from_fn_with_state(
                        self.auth.clone(),
                        auth_middleware,
                    )),
            )
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;

        tracing::info!(addr = %listener.local_addr()?, "Gateway listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "API Working." }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();
    match state.database().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                version,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    version,
                }),
            )
        }
    }
}
