//! TaskHub: workspace and membership API with identity-provider sync.
//!
//! The binary (`taskhub run`, `taskhub migrate`) wraps [`TaskHub`]; embedders
//! can build the same service programmatically.

mod runtime;

pub use runtime::{TaskHub, TaskHubBuilder};

pub use taskhub_core::config::TaskHubConfig;
pub use taskhub_runtime::sync::{SyncContext, SyncFunction, SyncInfo};
