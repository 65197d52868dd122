use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::db::storage::{StoreError, User};
use crate::domain::UserId;
use crate::entities::users;

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            username: model.username,
            password_hash: model.password_hash,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a user; a unique violation on `username` becomes
    /// [`StoreError::DuplicateUsername`] and the transaction is rolled back.
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<UserId, StoreError> {
        let txn = self.conn.begin().await?;

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let inserted = match active.insert(&txn).await {
            Ok(model) => model,
            Err(e) if StoreError::is_unique_violation(&e) => {
                txn.rollback().await?;
                return Err(StoreError::DuplicateUsername);
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;

        Ok(UserId::new(inserted.id))
    }

    /// Get user by exact username
    pub async fn get_by_username(&self, username: &str) -> Result<User, StoreError> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?
            .map(User::from)
            .ok_or(StoreError::NotFound)
    }
}
