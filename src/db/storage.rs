//! Storage capability set used by the session manager, the gate and the vault.
//!
//! [`Storage`] covers credential, token and data operations. The sea-orm
//! backed [`crate::db::Store`] is the production implementation;
//! [`crate::db::memory::MemoryStore`] is a fake for tests.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{AuthToken, DataKind, UserId};

/// Errors surfaced by storage backends.
///
/// Constraint violations are typed so callers can tell user error from
/// system failure. Everything else collapses into [`StoreError::Database`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("token value already exists")]
    TokenCollision,

    #[error("no active token")]
    NoActiveToken,

    #[error("record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl StoreError {
    /// True when the underlying database rejected a write because of a
    /// unique constraint.
    #[must_use]
    pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
        matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        )
    }
}

/// Registered user as seen by the services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// A stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    pub id: i32,
    pub user_id: UserId,
    pub name: String,
    pub kind: DataKind,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Creates a user row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateUsername`] if the username is taken;
    /// nothing is written in that case.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError>;

    /// Looks a user up by exact username.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such user exists.
    async fn get_user(&self, username: &str) -> Result<User, StoreError>;

    /// Stores a new session token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TokenCollision`] if the value is already stored.
    async fn create_token(
        &self,
        user_id: UserId,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<i32, StoreError>;

    /// Resolves a token to its owner if it is live at `now`
    /// (`expires_at >= now`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActiveToken`] both for unknown and for expired
    /// tokens.
    async fn resolve_token(&self, token: &AuthToken, now: DateTime<Utc>)
    -> Result<User, StoreError>;

    /// Moves the expiry of `token` to `expires_at`, even if it has already
    /// expired. Unknown tokens are left alone.
    async fn prolong_token(
        &self,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Inserts the blob or, if `(user_id, name)` exists, replaces its kind and
    /// bytes. Returns the row id.
    async fn upsert_data(
        &self,
        user_id: UserId,
        name: &str,
        kind: DataKind,
        bytes: &[u8],
    ) -> Result<i32, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the user has no blob called `name`.
    async fn get_data(&self, user_id: UserId, name: &str) -> Result<DataItem, StoreError>;

    /// Names of all blobs of `user_id` in insertion order.
    async fn list_data_names(&self, user_id: UserId) -> Result<Vec<String>, StoreError>;

    /// Cheap liveness probe of the backend.
    async fn ping(&self) -> Result<(), StoreError>;
}
