use std::future::Future;
use std::pin::Pin;

use taskhub_core::error::Result;
use taskhub_core::IdentityEvent;

use super::context::SyncContext;

/// A function triggered by exactly one identity event.
pub trait SyncFunction: Send + Sync + 'static {
    /// Function metadata.
    fn info() -> SyncInfo;

    /// Apply the event. The returned value is reported back to the runner.
    fn execute(
        ctx: &SyncContext,
        event: IdentityEvent,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + '_>>;
}

/// Sync function metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncInfo {
    /// Stable function id, used by the runner to invoke it.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Event name that triggers the function.
    pub trigger: &'static str,
}
