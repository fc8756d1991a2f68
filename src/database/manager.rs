use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Errors from the relational persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database is not configured")]
    NotConfigured,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Ordered schema migrations; each step is one version of the record shape.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Tables owned by the service, dropped in this order on reset
const TABLES: &[&str] = &["todos", "users", "_sqlx_migrations"];

/// Owns the SQLite connection pool and the schema lifecycle
#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open a pool for `url`, creating the database file when missing.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own empty database
        let pool = if Self::is_in_memory(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        info!("Created database pool for: {}", url);
        Ok(Self { pool })
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Drop every table and rebuild the schema from the first migration
    pub async fn reset(&self) -> Result<(), DatabaseError> {
        for table in TABLES {
            let sql = format!("DROP TABLE IF EXISTS {}", Self::quote_identifier(table));
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        info!("Dropped all tables");
        self.migrate().await
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn is_in_memory(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }
}
