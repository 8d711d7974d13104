// Data models for the credential gate

use serde::{Deserialize, Serialize};

/// A registered user, as stored in the `credentials` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Credential {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub last_login: Option<i64>, // Unix seconds; None until the first login
    pub created_at: i64,
}

/// Authentication status of the process while the gate runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Registering,
    Authenticating,
    Authenticated,
    Failed,
}

/// Steps of the gate state machine. `Ready` is the only terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Start,
    FirstUserRegistration,
    ChoicePrompt,
    LoginFlow,
    RegisterFlow,
    Ready,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    #[error("No more input available for the prompt")]
    PromptClosed,
}

impl AuthError {
    /// Errors the gate reports and absorbs by re-prompting
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::StoreUnavailable(_)
                | AuthError::DuplicateUsername(_)
                | AuthError::InvalidCredentials
                | AuthError::DatabaseError(_)
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AuthError::StoreUnavailable(err.to_string()),
            other => AuthError::DatabaseError(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AuthError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AuthError::StoreUnavailable(format!("migration failed: {}", err))
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
