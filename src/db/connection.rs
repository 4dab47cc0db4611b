/// Store connection management
///
/// Opens the SQLite file backing the command store and materializes the schema.

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of database connections in the pool
const MAX_CONNECTIONS: u32 = 5;

/// Tables the schema file is expected to create
const TABLES: &[&str] = &["commands", "directories", "command_context"];

/// Persistent command store with connection pool
#[derive(Clone)]
pub struct Store {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl Store {
    /// Open (or create) a store
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file, usually `<save_dir>/remember.db`
    ///
    /// # Returns
    /// * `Ok(Store)` - Store with its schema in place
    /// * `Err(RememberError)` - If the file cannot be created or opened
    ///
    /// # Examples
    /// ```no_run
    /// use remember_lib::db::Store;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = Store::open("/home/me/.remember3/remember.db").await?;
    /// println!("{} commands", store.count().await?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let store = Self {
            pool: Arc::new(pool),
            db_path,
        };

        store.initialize_schema().await?;

        Ok(store)
    }

    /// Create a test store in memory
    ///
    /// A single connection that never expires, since every new in-memory
    /// connection would see an empty database.
    #[cfg(test)]
    pub async fn new_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self {
            pool: Arc::new(pool),
            db_path: PathBuf::from(":memory:"),
        };

        store.initialize_schema().await?;

        Ok(store)
    }

    /// Initialize database schema
    ///
    /// Runs `database/schema.sql`. Every statement is `IF NOT EXISTS`, so
    /// tables are only created when they are truly absent.
    async fn initialize_schema(&self) -> Result<()> {
        let missing = self.missing_tables().await?;
        if missing.is_empty() {
            debug!(path = %self.db_path.display(), "schema already present");
            return Ok(());
        }

        let schema = include_str!("../../database/schema.sql");

        // SQLite won't run several statements in one execute
        for statement in schema.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed).execute(self.pool.as_ref()).await?;
            }
        }

        info!(path = %self.db_path.display(), tables = ?missing, "created store tables");

        Ok(())
    }

    async fn missing_tables(&self) -> Result<Vec<&'static str>> {
        let mut missing = Vec::new();
        for table in TABLES {
            let (exists,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(*table)
            .fetch_one(self.pool.as_ref())
            .await?;

            if exists == 0 {
                missing.push(*table);
            }
        }
        Ok(missing)
    }

    /// Get reference to the connection pool
    ///
    /// Used internally by query modules.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Close all connections in the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get store statistics
    pub async fn stats(&self) -> Result<StoreStats> {
        let command_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM commands")
            .fetch_one(self.pool.as_ref())
            .await?;

        let directory_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM directories")
            .fetch_one(self.pool.as_ref())
            .await?;

        let context_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM command_context")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(StoreStats {
            total_commands: command_count.0,
            total_directories: directory_count.0,
            total_contexts: context_count.0,
        })
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_commands: i64,
    pub total_directories: i64,
    pub total_contexts: i64,
}
