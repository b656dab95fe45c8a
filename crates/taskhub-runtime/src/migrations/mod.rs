//! Schema migrations.
//!
//! The embedded schema is applied first, then any `NNNN_name.sql` files found
//! in the configured directory. Applied names are recorded in
//! `taskhub_migrations`.

mod builtin;
mod runner;

pub use builtin::builtin_migrations;
pub use runner::{load_migrations_from_dir, Migration, MigrationRunner, MigrationStatus};
