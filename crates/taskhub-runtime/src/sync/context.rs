use sqlx::PgPool;

/// Per-invocation context handed to sync functions.
#[derive(Clone)]
pub struct SyncContext {
    db_pool: PgPool,
    /// Delivery id of the triggering event, when the runner sent one.
    pub event_id: Option<String>,
    /// Zero-based retry attempt reported by the runner.
    pub attempt: u32,
}

impl SyncContext {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            event_id: None,
            attempt: 0,
        }
    }

    pub fn with_event_id(mut self, event_id: Option<String>) -> Self {
        self.event_id = event_id;
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn db(&self) -> &PgPool {
        &self.db_pool
    }
}
