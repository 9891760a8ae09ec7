//! Database layer for the Chama calling board.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. The `calls` table and its indexes are created
//! through versioned migrations managed by this crate.
//!
//! Every panel and display in a clinic talks to the same database file. WAL
//! mode lets the displays keep reading while the panel inserts.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError, IN_MEMORY};
