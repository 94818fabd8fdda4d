//! Database Layer with Connection Pooling
//!
//! SQLite database layer featuring:
//! - Connection pooling via r2d2 for concurrent access
//! - Schema version tracked in `PRAGMA user_version`
//! - WAL mode for concurrent read/write

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::types::{Result, ResultExt, TierError};

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Schema version stored in `PRAGMA user_version`
const SCHEMA_VERSION: u32 = 1;

/// Connection pool configuration
///
/// Pool size is dynamically calculated based on CPU cores.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,
    /// Minimum idle connections to keep ready
    pub min_idle: u32,
    /// Timeout for acquiring a connection (seconds)
    pub connection_timeout_secs: u64,
}

impl PoolConfig {
    /// Minimum pool size regardless of CPU count
    const MIN_POOL_SIZE: u32 = 2;
    /// Maximum pool size regardless of CPU count
    const MAX_POOL_SIZE: u32 = 16;

    /// Calculate pool size from available CPU cores
    ///
    /// Formula: clamp(cores, MIN, MAX)
    pub fn optimal_pool_size() -> u32 {
        let cores = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);
        cores.clamp(Self::MIN_POOL_SIZE, Self::MAX_POOL_SIZE)
    }

    /// Create config with automatic pool sizing based on CPU cores
    pub fn auto() -> Self {
        let max_size = Self::optimal_pool_size();
        Self {
            max_size,
            min_idle: 1,
            connection_timeout_secs: 30,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::auto()
    }
}

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, PoolConfig::default())
    }

    /// Open database with custom pool configuration.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: PoolConfig) -> Result<Self> {
        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(config.min_idle))
            .connection_timeout(std::time::Duration::from_secs(
                config.connection_timeout_secs,
            ))
            .build(manager)
            .map_err(|e| TierError::Storage(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self { pool })
    }

    /// Open an in-memory database for testing or temporary use.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();

        // Every in-memory connection is a separate database: keep exactly one
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| TierError::Storage(format!("Failed to create in-memory pool: {}", e)))?;

        Ok(Self { pool })
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA wal_autocheckpoint = 1000;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            TierError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Create the schema on a fresh database; reject one written by a newer schema.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        let current_version = Self::user_version(&conn)?;

        if current_version == 0 {
            conn.execute_batch(SCHEMA)
                .with_context("Failed to initialize database schema")?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .with_context("Failed to set schema version")?;
            tracing::debug!("Initialized cache schema v{}", SCHEMA_VERSION);
            return Ok(());
        }

        if current_version > SCHEMA_VERSION {
            return Err(TierError::Storage(format!(
                "Database schema v{} is newer than supported v{}",
                current_version, SCHEMA_VERSION
            )));
        }

        Ok(())
    }

    fn user_version(conn: &Connection) -> Result<u32> {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .with_context("Failed to read schema version")
    }

    /// Current schema version of the open database
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        Self::user_version(&conn)
    }

    /// Get a raw connection for queries.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.conn()
    }
}
