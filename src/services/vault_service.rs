//! Domain service for a user's stored blobs.

use thiserror::Error;

use crate::db::StoreError;
use crate::domain::DataKind;
use crate::services::auth_service::{AuthContext, AuthError};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Data not found: {0}")]
    NotFound(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for VaultError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoActiveToken => Self::Unauthenticated,
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<AuthError> for VaultError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => Self::Unauthenticated,
            AuthError::Validation(msg) => Self::Validation(msg),
            AuthError::Database(msg) => Self::Database(msg),
            AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// A blob as handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredData {
    pub kind: DataKind,
    pub bytes: Vec<u8>,
}

/// Per-user blob operations. Every call counts as activity on the caller's
/// token and prolongs it before doing anything else.
#[async_trait::async_trait]
pub trait VaultService: Send + Sync {
    /// Stores `bytes` under `name`, replacing any blob already there.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Validation`] for an unknown kind code, an empty
    /// or oversized name, or an oversized payload.
    async fn upload(
        &self,
        ctx: &AuthContext,
        name: &str,
        kind_code: i32,
        bytes: Vec<u8>,
    ) -> Result<(), VaultError>;

    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] if the caller has no blob `name`.
    async fn get(&self, ctx: &AuthContext, name: &str) -> Result<StoredData, VaultError>;

    /// Names of the caller's blobs, oldest first.
    async fn list_names(&self, ctx: &AuthContext) -> Result<Vec<String>, VaultError>;
}
