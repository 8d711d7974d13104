use super::database::Database;
use crate::models::credential::{AuthError, AuthResult, Credential};
use async_trait::async_trait;
use log::{debug, info};
use sqlx::{Executor, Sqlite};
use std::sync::Arc;

/// Narrow interface the credential gate uses to reach the credential store
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Number of registered users; zero forces first-user registration
    async fn count_credentials(&self) -> AuthResult<i64>;

    async fn find_credential(&self, username: &str) -> AuthResult<Option<Credential>>;

    /// Register `username`. Fails with `DuplicateUsername` if it is already taken.
    async fn create_credential(&self, username: &str, password_hash: &str) -> AuthResult<Credential>;

    /// Look up a user by name and password digest
    async fn verify_credential(&self, username: &str, password_hash: &str) -> AuthResult<Option<Credential>>;

    async fn touch_last_login(&self, credential_id: &str, timestamp: i64) -> AuthResult<()>;
}

/// SQLite-backed credential store
#[derive(Clone)]
pub struct CredentialManager {
    db: Arc<Database>,
}

impl CredentialManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn fetch_by_username<'e, E>(executor: E, username: &str) -> AuthResult<Option<Credential>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, username, password_hash, last_login, created_at
             FROM credentials WHERE username = ?"
        )
        .bind(username)
        .fetch_optional(executor)
        .await?;

        Ok(credential)
    }
}

#[async_trait]
impl CredentialStore for CredentialManager {
    async fn count_credentials(&self) -> AuthResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    async fn find_credential(&self, username: &str) -> AuthResult<Option<Credential>> {
        Self::fetch_by_username(self.db.pool(), username).await
    }

    async fn create_credential(&self, username: &str, password_hash: &str) -> AuthResult<Credential> {
        let mut tx = self.db.pool().begin().await?;

        if Self::fetch_by_username(&mut *tx, username).await?.is_some() {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let credential = Credential {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            last_login: None,
            created_at: chrono::Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO credentials (id, username, password_hash, last_login, created_at)
             VALUES (?, ?, ?, NULL, ?)"
        )
        .bind(&credential.id)
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(credential.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AuthError::DuplicateUsername(username.to_string())
            }
            other => AuthError::from(other),
        })?;

        tx.commit().await?;

        info!("Registered user {}", credential.username);
        Ok(credential)
    }

    async fn verify_credential(&self, username: &str, password_hash: &str) -> AuthResult<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, username, password_hash, last_login, created_at
             FROM credentials WHERE username = ? AND password_hash = ?"
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(self.db.pool())
        .await?;

        debug!("Credential check for {}: {}", username, credential.is_some());
        Ok(credential)
    }

    async fn touch_last_login(&self, credential_id: &str, timestamp: i64) -> AuthResult<()> {
        sqlx::query("UPDATE credentials SET last_login = ? WHERE id = ?")
            .bind(timestamp)
            .bind(credential_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
