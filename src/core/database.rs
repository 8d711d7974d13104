use crate::models::credential::AuthResult;
use log::{debug, info};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the SQLite file at `path` and run migrations
    pub async fn connect(path: &Path, max_connections: u32) -> AuthResult<Self> {
        let db_url = format!("sqlite://{}", path.display());

        // Create database directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }

        if !Sqlite::database_exists(&db_url).await? {
            info!("Creating credential database at {}", path.display());
            Sqlite::create_database(&db_url).await?;
        }

        Self::open(&db_url, max_connections).await
    }

    /// Connect to an existing database URL (e.g. `sqlite::memory:`) and run migrations
    pub async fn open(db_url: &str, max_connections: u32) -> AuthResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        debug!("Connected to credential store {}", db_url);
        Ok(db)
    }

    /// Get the pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> AuthResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Close every connection; later queries fail with `StoreUnavailable`
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Credential store connection closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::AuthError;

    #[tokio::test]
    async fn test_open_runs_migrations() {
        let db = Database::open("sqlite::memory:", 1)
            .await
            .expect("Failed to open in-memory database");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(db.pool())
            .await
            .expect("credentials table should exist");

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = std::env::temp_dir().join(format!("coil_test_db_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("credentials.db");

        let db = Database::connect(&path, 1)
            .await
            .expect("Failed to create database file");
        assert!(path.exists());

        db.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let db = Database::open("sqlite::memory:", 1).await.unwrap();
        db.close().await;
        assert!(db.is_closed());

        let result: Result<i64, AuthError> = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(db.pool())
            .await
            .map_err(AuthError::from);

        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
    }
}
