use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;

use crate::db::storage::{StoreError, User};
use crate::domain::{AuthToken, UserId};
use crate::entities::{auth_tokens, prelude::*};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: UserId,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<i32, StoreError> {
        let txn = self.conn.begin().await?;

        let active = auth_tokens::ActiveModel {
            user_id: Set(user_id.value()),
            token: Set(token.as_str().to_string()),
            created_at: Set(Utc::now()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        let inserted = match active.insert(&txn).await {
            Ok(model) => model,
            Err(e) if StoreError::is_unique_violation(&e) => {
                txn.rollback().await?;
                return Err(StoreError::TokenCollision);
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;

        Ok(inserted.id)
    }

    /// Existence and liveness are checked by one query, so an expired token
    /// is indistinguishable from an unknown one.
    pub async fn resolve(&self, token: &AuthToken, now: DateTime<Utc>) -> Result<User, StoreError> {
        let row = AuthTokens::find()
            .filter(auth_tokens::Column::Token.eq(token.as_str()))
            .filter(auth_tokens::Column::ExpiresAt.gte(now))
            .find_also_related(Users)
            .one(&self.conn)
            .await?;

        match row {
            Some((_, Some(user))) => Ok(User::from(user)),
            _ => {
                debug!("no active token found");
                Err(StoreError::NoActiveToken)
            }
        }
    }

    pub async fn prolong(
        &self,
        token: &AuthToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let txn = self.conn.begin().await?;

        AuthTokens::update_many()
            .col_expr(auth_tokens::Column::ExpiresAt, Expr::value(expires_at))
            .filter(auth_tokens::Column::Token.eq(token.as_str()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(())
    }
}
