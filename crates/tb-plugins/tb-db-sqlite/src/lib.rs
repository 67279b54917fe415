//! # tb-db-sqlite Implementation
//!
//! This crate implements the data mapping between the SQLite relational model
//! and the `tb-core` domain models. One [`SqliteStore`] serves every port:
//! [`BoardRepo`](tb_core::BoardRepo), [`UserRepo`](tb_core::UserRepo) and
//! [`ContentRepo`](tb_core::ContentRepo).

mod boards;
mod content;
mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tb_core::error::{AppError, Result};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies pending
    /// migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            // Every connection to `:memory:` is a separate database; pin one.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await.map_err(db_err)?;
        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url, in_memory, "sqlite store ready");
        Ok(store)
    }

    /// A private, migrated database living as long as the store.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Classifies store failures into domain errors.
pub(crate) fn db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        match db.kind() {
            ErrorKind::UniqueViolation => return AppError::Conflict(db.message().to_string()),
            ErrorKind::ForeignKeyViolation => {
                return AppError::NotFound("Referenced row", "unknown".to_string())
            }
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                return AppError::ValidationError(db.message().to_string())
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "sqlite error");
    AppError::Internal(err.to_string())
}
