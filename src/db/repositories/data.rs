use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use crate::db::storage::{DataItem, StoreError};
use crate::domain::{DataKind, UserId};
use crate::entities::{prelude::*, user_data};

impl TryFrom<user_data::Model> for DataItem {
    type Error = StoreError;

    fn try_from(model: user_data::Model) -> Result<Self, Self::Error> {
        let kind = DataKind::from_code(model.kind).ok_or_else(|| {
            StoreError::Database(format!(
                "unknown data kind {} stored for item {}",
                model.kind, model.id
            ))
        })?;

        Ok(Self {
            id: model.id,
            user_id: UserId::new(model.user_id),
            name: model.name,
            kind,
            bytes: model.data,
        })
    }
}

pub struct DataRepository {
    conn: DatabaseConnection,
}

impl DataRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// One `INSERT .. ON CONFLICT (user_id, name) DO UPDATE` statement;
    /// concurrent uploads of the same name end up as last-commit-wins.
    pub async fn upsert(
        &self,
        user_id: UserId,
        name: &str,
        kind: DataKind,
        bytes: &[u8],
    ) -> Result<i32, StoreError> {
        let txn = self.conn.begin().await?;

        let active_model = user_data::ActiveModel {
            user_id: Set(user_id.value()),
            name: Set(name.to_string()),
            kind: Set(kind.code()),
            data: Set(bytes.to_vec()),
            ..Default::default()
        };

        UserData::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    user_data::Column::UserId,
                    user_data::Column::Name,
                ])
                .update_columns([user_data::Column::Kind, user_data::Column::Data])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        // last_insert_rowid is not touched by the update branch, so read the
        // id back inside the same transaction.
        let id = UserData::find()
            .select_only()
            .column(user_data::Column::Id)
            .filter(user_data::Column::UserId.eq(user_id.value()))
            .filter(user_data::Column::Name.eq(name))
            .into_tuple::<i32>()
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::Database(format!("upserted item '{name}' vanished")))?;

        txn.commit().await?;

        Ok(id)
    }

    pub async fn get(&self, user_id: UserId, name: &str) -> Result<DataItem, StoreError> {
        let row = UserData::find()
            .filter(user_data::Column::UserId.eq(user_id.value()))
            .filter(user_data::Column::Name.eq(name))
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        DataItem::try_from(row)
    }

    pub async fn list_names(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        let names = UserData::find()
            .select_only()
            .column(user_data::Column::Name)
            .filter(user_data::Column::UserId.eq(user_id.value()))
            .order_by_asc(user_data::Column::Id)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;

        Ok(names)
    }
}
