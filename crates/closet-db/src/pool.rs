//! Connection pool management for SQLite via r2d2.

use closet_core::config::DatabaseConfig;
use closet_core::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (creating if needed) the database file named by `config` and run
/// pending migrations.
///
/// Connections use WAL journaling and the configured busy timeout.
pub fn init_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(&config.path);
    build_pool(manager, config, true)
}

/// Initialize an in-memory database pool with default sizing.
///
/// Each call creates a uniquely-named shared-cache in-memory database, so
/// separate pools never see each other's rows while connections within one
/// pool share state.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:closet_memdb_{n}?mode=memory&cache=shared");

    build_pool(SqliteConnectionManager::file(uri), &DatabaseConfig::default(), false)
}

fn build_pool(
    manager: SqliteConnectionManager,
    config: &DatabaseConfig,
    wal: bool,
) -> Result<DbPool> {
    let busy_timeout = config.busy_timeout();
    let manager = manager.with_init(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(config.pool_size.max(1))
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;

    migrations::run_migrations(&*get_conn(&pool)?)?;
    tracing::debug!(
        path = %config.path.display(),
        pool_size = pool.max_size(),
        "Database pool ready"
    );

    Ok(pool)
}

/// Convenience helper to get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}
