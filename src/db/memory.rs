//! In-process [`Storage`] used by tests that don't need a database.
//!
//! Every operation runs under one mutex, so each call is atomic with respect
//! to the others, mirroring the transactional guarantees of [`super::Store`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::storage::{DataItem, Storage, StoreError, User};
use crate::domain::{AuthToken, DataKind, UserId};

#[derive(Debug, Clone)]
struct TokenRow {
    user_id: UserId,
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    tokens: Vec<(i32, TokenRow)>,
    data: Vec<DataItem>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current expiry of a stored token, expired or not.
    pub async fn token_expiry(&self, token: &AuthToken) -> Option<DateTime<Utc>> {
        let tables = self.tables.lock().await;
        tables
            .tokens
            .iter()
            .find(|(_, row)| row.value == token.as_str())
            .map(|(_, row)| row.expires_at)
    }

    pub async fn token_count(&self) -> usize {
        self.tables.lock().await.tokens.len()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::DuplicateUsername);
        }

        let id = UserId::new(tables.next_id());
        tables.users.push(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        });

        Ok(id)
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_token(
        &self,
        user_id: UserId,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<i32, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.user(user_id).is_none() {
            return Err(StoreError::Database(format!(
                "foreign key violation: user {user_id} does not exist"
            )));
        }
        if tables.tokens.iter().any(|(_, row)| row.value == token.as_str()) {
            return Err(StoreError::TokenCollision);
        }

        let id = tables.next_id();
        tables.tokens.push((
            id,
            TokenRow {
                user_id,
                value: token.as_str().to_string(),
                expires_at,
            },
        ));

        Ok(id)
    }

    async fn resolve_token(
        &self,
        token: &AuthToken,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let tables = self.tables.lock().await;

        tables
            .tokens
            .iter()
            .find(|(_, row)| row.value == token.as_str() && row.expires_at >= now)
            .and_then(|(_, row)| tables.user(row.user_id))
            .cloned()
            .ok_or(StoreError::NoActiveToken)
    }

    async fn prolong_token(
        &self,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;

        for (_, row) in tables
            .tokens
            .iter_mut()
            .filter(|(_, row)| row.value == token.as_str())
        {
            row.expires_at = expires_at;
        }

        Ok(())
    }

    async fn upsert_data(
        &self,
        user_id: UserId,
        name: &str,
        kind: DataKind,
        bytes: &[u8],
    ) -> Result<i32, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.user(user_id).is_none() {
            return Err(StoreError::Database(format!(
                "foreign key violation: user {user_id} does not exist"
            )));
        }

        if let Some(item) = tables
            .data
            .iter_mut()
            .find(|d| d.user_id == user_id && d.name == name)
        {
            item.kind = kind;
            item.bytes = bytes.to_vec();
            return Ok(item.id);
        }

        let id = tables.next_id();
        tables.data.push(DataItem {
            id,
            user_id,
            name: name.to_string(),
            kind,
            bytes: bytes.to_vec(),
        });

        Ok(id)
    }

    async fn get_data(&self, user_id: UserId, name: &str) -> Result<DataItem, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .data
            .iter()
            .find(|d| d.user_id == user_id && d.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_data_names(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .data
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.name.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
