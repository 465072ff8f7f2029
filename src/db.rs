//! SQLite connection setup.

use crate::error::{DbError, Result};

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Database handles.
#[derive(Debug, Clone)]
pub struct Db {
    pub sqlite: SqlitePool,
}

impl Db {
    /// Open (creating if needed) the SQLite database at `path` and run migrations.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let sqlite = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(DbError::SqliteConnect)?;

        MIGRATOR
            .run(&sqlite)
            .await
            .map_err(|error| DbError::Migration(error.to_string()))?;

        tracing::info!(path = %path.display(), "sqlite ready");

        Ok(Self { sqlite })
    }

    /// In-memory database with migrations applied.
    pub async fn in_memory() -> Result<Self> {
        let sqlite = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(DbError::SqliteConnect)?;

        MIGRATOR
            .run(&sqlite)
            .await
            .map_err(|error| DbError::Migration(error.to_string()))?;

        Ok(Self { sqlite })
    }

    pub async fn close(&self) {
        self.sqlite.close().await;
    }
}
