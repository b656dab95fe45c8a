pub mod db;
pub mod gateway;
pub mod migrations;
pub mod store;
pub mod sync;

pub use db::Database;
pub use gateway::{AppState, AuthMiddleware, GatewayServer};
pub use migrations::{Migration, MigrationRunner};
pub use sync::{SyncContext, SyncFunction, SyncRegistry};
