//! Connection pool for the shared calls database.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use thiserror::Error;

/// Path that selects a private in-memory database per connection.
pub const IN_MEMORY: &str = ":memory:";

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections. Each open display
    /// stream borrows one briefly per snapshot.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),

    /// The directory that should hold the database file could not be created.
    #[error("failed to create database directory {path}: {source}")]
    Directory {
        path: String,
        source: std::io::Error,
    },
}

/// Per-connection setup: WAL journal, foreign keys, busy timeout.
fn init_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    // In-memory databases answer "memory" instead of "wal".
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if !matches!(journal_mode.as_str(), "wal" | "memory") {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal mode stayed {journal_mode}, expected wal")),
        ));
    }
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {busy_timeout_ms};"
    ))
}

/// Creates the parent directory of a file-backed database, so a fresh
/// install can point `database.path` at e.g. `data/chama.db`.
fn ensure_parent_dir(db_path: &str) -> Result<(), PoolError> {
    if db_path == IN_MEMORY {
        return Ok(());
    }
    match Path::new(db_path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir).map_err(|source| PoolError::Directory {
                path: dir.display().to_string(),
                source,
            })?;
            tracing::info!(path = %dir.display(), "created database directory");
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Opens the calls database behind an r2d2 pool.
///
/// `db_path` may be [`IN_MEMORY`] for tests. Every pooled connection to an
/// in-memory database sees its own private database, so such pools should
/// be built with `pool_max_size: 1`.
///
/// # Errors
///
/// Returns `PoolError::Directory` if the database directory cannot be
/// created, or `PoolError::PoolInit` if the pool cannot be built.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    ensure_parent_dir(db_path)?;

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let busy_timeout_ms = settings.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| init_connection(conn, busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        pool_max_size = settings.pool_max_size,
        busy_timeout_ms,
        "database pool ready"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_applies_settings() {
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 2_500,
            pool_max_size: 1,
        };

        let pool = create_pool(IN_MEMORY, settings).expect("pool creation should succeed");
        let conn = pool.get().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert!(
            mode == "wal" || mode == "memory",
            "unexpected journal_mode: {mode}"
        );

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1, "foreign keys should be enabled");

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500);
        assert_eq!(pool.max_size(), 1);
    }

    #[test]
    fn missing_database_directory_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("clinic").join("chama.db");
        let path = path.to_str().expect("utf-8 temp path");

        let pool = create_pool(path, DbRuntimeSettings::default()).expect("pool should open");
        let mode: String = pool
            .get()
            .expect("connection")
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("journal_mode");
        assert_eq!(mode, "wal");
        assert!(dir.path().join("data").join("clinic").is_dir());
    }

    #[test]
    fn directory_blocked_by_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"not a directory").expect("write blocker");
        let path = blocker.join("chama.db");

        let err = create_pool(path.to_str().expect("utf-8"), DbRuntimeSettings::default())
            .expect_err("a file in place of the directory should fail");
        assert!(matches!(err, PoolError::Directory { .. }));
    }
}
