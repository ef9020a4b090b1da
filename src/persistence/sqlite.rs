//! SQLite connection management for the persistence layer.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// `DB_PATH` value selecting an ephemeral in-memory store.
pub const MEMORY_DB: &str = ":memory:";

/// SQLite-backed persistence layer using `sqlx::SqlitePool`.
///
/// Table-specific queries live in the sibling `sessions`, `users` and
/// `waitlist` modules as further `impl` blocks on this type.
#[derive(Debug, Clone)]
pub struct SqlitePersistence {
    pub(super) pool: SqlitePool,
}

impl SqlitePersistence {
    /// Opens (or creates) the database at `db_path` and applies the schema.
    ///
    /// `":memory:"` opens a private in-memory database on a single pinned
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the file cannot be opened or the schema
    /// cannot be applied.
    pub async fn connect(db_path: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = if db_path == MEMORY_DB {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(db_path).parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            let options = SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Opens the store described by `config`.
    ///
    /// With `strict_storage` off, a file that cannot be opened degrades to
    /// an in-memory store so the service still answers requests.
    ///
    /// # Errors
    ///
    /// Returns the driver error when strict storage is on, or when even the
    /// in-memory fallback cannot be opened.
    pub async fn open(config: &GatewayConfig) -> Result<Self, sqlx::Error> {
        match Self::connect(&config.db_path, config.database_max_connections).await {
            Ok(store) => Ok(store),
            Err(e) if !config.strict_storage && config.db_path != MEMORY_DB => {
                tracing::warn!(
                    db_path = %config.db_path,
                    error = %e,
                    "database unavailable; falling back to in-memory store"
                );
                Self::connect(MEMORY_DB, 1).await
            }
            Err(e) => Err(e),
        }
    }

    /// Opens a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the schema cannot be applied.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        Self::connect(MEMORY_DB, 1).await
    }

    /// Round-trips a trivial query.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::Storage`] if the database does not answer.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_answers_ping() {
        let Ok(store) = SqlitePersistence::in_memory().await else {
            panic!("in-memory store");
        };
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn file_store_is_created_and_reopened() {
        let dir = std::env::temp_dir().join(format!("cryptochat-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("test.db");
        let Some(path) = path.to_str().map(str::to_string) else {
            panic!("utf-8 temp path");
        };

        let Ok(store) = SqlitePersistence::connect(&path, 2).await else {
            panic!("first open");
        };
        store.close().await;

        // Re-applying the schema against an existing file is a no-op.
        let Ok(store) = SqlitePersistence::connect(&path, 2).await else {
            panic!("second open");
        };
        assert!(store.ping().await.is_ok());
        store.close().await;

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn lenient_open_falls_back_to_memory() {
        let config = GatewayConfig {
            db_path: "/proc/definitely/not/writable/x.db".to_string(),
            strict_storage: false,
            ..GatewayConfig::default()
        };
        let Ok(store) = SqlitePersistence::open(&config).await else {
            panic!("fallback store");
        };
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn strict_open_fails() {
        let config = GatewayConfig {
            db_path: "/proc/definitely/not/writable/x.db".to_string(),
            strict_storage: true,
            ..GatewayConfig::default()
        };
        assert!(SqlitePersistence::open(&config).await.is_err());
    }
}
