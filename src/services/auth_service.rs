//! Domain service for registration, login and session handling.
//!
//! Issues bearer tokens, verifies passwords and slides token expiry forward
//! on authenticated activity.

use thiserror::Error;

use crate::db::StoreError;
use crate::domain::{AuthToken, UserId};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password; deliberately not split further.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, unknown or expired token.
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoActiveToken => Self::Unauthenticated,
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a registration attempt. A taken username is an expected
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(AuthToken),
    UsernameTaken,
}

/// Identity of the caller, resolved from its bearer token.
///
/// Handlers receive this as an explicit parameter; holding one means the
/// token was live when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub username: String,
    pub token: AuthToken,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a user and issues a first token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for empty or oversized input.
    async fn register(&self, username: &str, password: &str)
    -> Result<RegisterOutcome, AuthError>;

    /// Verifies credentials and issues a fresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] whether the user is unknown
    /// or the password is wrong.
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthToken, AuthError>;

    /// Resolves a bearer token to the caller's identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] for unknown and expired tokens
    /// alike.
    async fn resolve(&self, token: &AuthToken) -> Result<AuthContext, AuthError>;

    /// Pushes the token's expiry to now plus the configured lifetime.
    async fn prolong(&self, token: &AuthToken) -> Result<(), AuthError>;
}
