use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use taskhub_core::error::Result;
use taskhub_core::IdentityEvent;

use super::context::SyncContext;
use super::traits::{SyncFunction, SyncInfo};

/// Type alias for boxed sync handler function.
pub type BoxedSyncHandler = Arc<
    dyn Fn(&SyncContext, IdentityEvent) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>
        + Send
        + Sync,
>;

/// Entry in the sync registry.
pub struct SyncEntry {
    pub info: SyncInfo,
    pub handler: BoxedSyncHandler,
}

impl SyncEntry {
    pub async fn run(&self, ctx: &SyncContext, event: IdentityEvent) -> Result<Value> {
        (self.handler)(ctx, event).await
    }
}

impl std::fmt::Debug for SyncEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEntry").field("info", &self.info).finish()
    }
}

/// Registry of sync functions, keyed by function id.
#[derive(Clone, Default)]
pub struct SyncRegistry {
    functions: HashMap<String, Arc<SyncEntry>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry with every built-in identity sync function.
    pub fn with_builtin_functions() -> Self {
        let mut registry = Self::new();
        super::functions::register_builtin_functions(&mut registry);
        registry
    }

    /// Register a function type. Registering the same id twice replaces it.
    pub fn register<F: SyncFunction>(&mut self) {
        let info = F::info();

        let handler: BoxedSyncHandler = Arc::new(F::execute);

        self.functions
            .insert(info.id.to_string(), Arc::new(SyncEntry { info, handler }));
    }

    /// Get a function by id.
    pub fn get(&self, id: &str) -> Option<Arc<SyncEntry>> {
        self.functions.get(id).cloned()
    }

    /// Resolve a runner-supplied id, which may carry an `<app_id>-` prefix.
    pub fn resolve(&self, app_id: &str, fn_id: &str) -> Option<Arc<SyncEntry>> {
        self.get(fn_id).or_else(|| {
            fn_id
                .strip_prefix(app_id)
                .and_then(|rest| rest.strip_prefix('-'))
                .and_then(|bare| self.get(bare))
        })
    }

    /// Every function triggered by `event_name`, ordered by id.
    pub fn triggered_by(&self, event_name: &str) -> Vec<Arc<SyncEntry>> {
        let mut matches: Vec<_> = self
            .functions
            .values()
            .filter(|e| e.info.trigger == event_name)
            .cloned()
            .collect();
        matches.sort_by_key(|e| e.info.id);
        matches
    }

    /// All function metadata, ordered by id.
    pub fn infos(&self) -> Vec<SyncInfo> {
        let mut infos: Vec<_> = self.functions.values().map(|e| e.info).collect();
        infos.sort_by_key(|i| i.id);
        infos
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskhub_core::event::names;

    struct Echo;

    impl SyncFunction for Echo {
        fn info() -> SyncInfo {
            SyncInfo {
                id: "echo",
                name: "Echo",
                trigger: "test/echo",
            }
        }

        fn execute(
            _ctx: &SyncContext,
            event: IdentityEvent,
        ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
            Box::pin(async move { Ok(event.data) })
        }
    }

    fn lazy_ctx() -> SyncContext {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/nonexistent")
            .expect("Failed to create lazy pool");
        SyncContext::new(pool)
    }

    #[test]
    fn test_empty_registry() {
        let registry = SyncRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("echo").is_none());
        assert!(registry.triggered_by("test/echo").is_empty());
    }

    #[test]
    fn test_builtin_registry_has_seven_functions() {
        let registry = SyncRegistry::with_builtin_functions();
        assert_eq!(registry.len(), 7);

        for (event, id) in [
            (names::USER_CREATED, "sync-user-from-clerk"),
            (names::USER_DELETED, "delete-user-from-clerk"),
            (names::USER_UPDATED, "update-user-from-clerk"),
            (names::ORGANIZATION_CREATED, "sync-workspace-from-clerk"),
            (names::ORGANIZATION_UPDATED, "update-workpace-from-clerk"),
            (names::ORGANIZATION_DELETED, "delete-workpace-from-clerk"),
            (names::INVITATION_ACCEPTED, "sync-workspace-member-from-clerk"),
        ] {
            let matches = registry.triggered_by(event);
            assert_eq!(matches.len(), 1, "event {}", event);
            assert_eq!(matches[0].info.id, id);
        }
    }

    #[test]
    fn test_regular_spelling_does_not_trigger() {
        let registry = SyncRegistry::with_builtin_functions();
        assert!(registry.triggered_by("clerk/organization.updated").is_empty());
        assert!(registry.triggered_by("clerk/organization.deleted").is_empty());
    }

    #[test]
    fn test_resolve_with_app_prefix() {
        let registry = SyncRegistry::with_builtin_functions();
        assert!(registry.resolve("my-app", "sync-user-from-clerk").is_some());
        assert_eq!(
            registry
                .resolve("my-app", "my-app-sync-user-from-clerk")
                .unwrap()
                .info
                .id,
            "sync-user-from-clerk"
        );
        assert!(registry.resolve("my-app", "other-app-sync-user-from-clerk").is_none());
        assert!(registry.resolve("my-app", "my-app-").is_none());
    }

    #[tokio::test]
    async fn test_run_registered_function() {
        let mut registry = SyncRegistry::new();
        registry.register::<Echo>();

        let entry = registry.get("echo").unwrap();
        let ctx = lazy_ctx();
        let out = entry
            .run(&ctx, IdentityEvent::new("test/echo", serde_json::json!({"x": 1})))
            .await;
        let out = tokio_test::assert_ok!(out);
        assert_eq!(out, serde_json::json!({"x": 1}));
    }
}
