use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::{AuthToken, DataKind, UserId};

pub mod memory;
pub mod migrator;
pub mod repositories;
pub mod storage;

pub use memory::MemoryStore;
pub use storage::{DataItem, Storage, StoreError, User};

/// sea-orm backed [`Storage`] over SQLite.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if let Some(path) = sqlite_file_path(db_url)
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Keeps trying to open the database until `timeout` elapses.
    pub async fn connect_with_retry(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match Self::with_pool_options(db_url, max_connections, min_connections).await {
                Ok(store) => return Ok(store),
                Err(e) if tokio::time::Instant::now() < deadline => {
                    warn!("Database not reachable yet: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => {
                    return Err(e.context(format!(
                        "Couldn't reach database within {}s",
                        timeout.as_secs()
                    )));
                }
            }
        }
    }

    /// Single-connection in-memory database, used by tests.
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_options("sqlite::memory:", 1, 1).await
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn data_repo(&self) -> repositories::data::DataRepository {
        repositories::data::DataRepository::new(self.conn.clone())
    }
}

/// File backing a `sqlite:` url, or `None` for in-memory databases.
fn sqlite_file_path(db_url: &str) -> Option<PathBuf> {
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path.contains(":memory:") {
        return None;
    }

    Some(PathBuf::from(path))
}

#[async_trait]
impl Storage for Store {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        self.user_repo().create(username, password_hash).await
    }

    async fn get_user(&self, username: &str) -> Result<User, StoreError> {
        self.user_repo().get_by_username(username).await
    }

    async fn create_token(
        &self,
        user_id: UserId,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<i32, StoreError> {
        self.token_repo().create(user_id, token, expires_at).await
    }

    async fn resolve_token(
        &self,
        token: &AuthToken,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        self.token_repo().resolve(token, now).await
    }

    async fn prolong_token(
        &self,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.token_repo().prolong(token, expires_at).await
    }

    async fn upsert_data(
        &self,
        user_id: UserId,
        name: &str,
        kind: DataKind,
        bytes: &[u8],
    ) -> Result<i32, StoreError> {
        self.data_repo().upsert(user_id, name, kind, bytes).await
    }

    async fn get_data(&self, user_id: UserId, name: &str) -> Result<DataItem, StoreError> {
        self.data_repo().get(user_id, name).await
    }

    async fn list_data_names(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        self.data_repo().list_names(user_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_file_path_skips_memory_urls() {
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
        assert_eq!(
            sqlite_file_path("sqlite:data/pam.db?mode=rwc"),
            Some(PathBuf::from("data/pam.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite://vault.db"),
            Some(PathBuf::from("vault.db"))
        );
    }

    #[tokio::test]
    async fn in_memory_store_pings() {
        let store = Store::in_memory().await.unwrap();
        store.ping().await.unwrap();
    }
}
