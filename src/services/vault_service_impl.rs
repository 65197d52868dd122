use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::constants::limits::{MAX_DATA_BYTES, MAX_DATA_NAME_LEN};
use crate::db::{Storage, StoreError};
use crate::domain::DataKind;
use crate::services::auth_service::{AuthContext, AuthService};
use crate::services::vault_service::{StoredData, VaultError, VaultService};

pub struct StoreVaultService {
    store: Arc<dyn Storage>,
    auth: Arc<dyn AuthService>,
}

impl StoreVaultService {
    #[must_use]
    pub fn new(store: Arc<dyn Storage>, auth: Arc<dyn AuthService>) -> Self {
        Self { store, auth }
    }

    async fn touch(&self, ctx: &AuthContext) -> Result<(), VaultError> {
        self.auth.prolong(&ctx.token).await?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), VaultError> {
    if name.is_empty() {
        return Err(VaultError::Validation("Data name is required".to_string()));
    }
    if name.len() > MAX_DATA_NAME_LEN {
        return Err(VaultError::Validation(format!(
            "Data name must be at most {MAX_DATA_NAME_LEN} bytes"
        )));
    }
    Ok(())
}

#[async_trait]
impl VaultService for StoreVaultService {
    async fn upload(
        &self,
        ctx: &AuthContext,
        name: &str,
        kind_code: i32,
        bytes: Vec<u8>,
    ) -> Result<(), VaultError> {
        self.touch(ctx).await?;

        validate_name(name)?;
        let kind = DataKind::try_from(kind_code)
            .map_err(|code| VaultError::Validation(format!("Unknown data kind: {code}")))?;
        if bytes.len() > MAX_DATA_BYTES {
            return Err(VaultError::Validation(format!(
                "Payload exceeds {MAX_DATA_BYTES} bytes"
            )));
        }

        let id = self
            .store
            .upsert_data(ctx.user_id, name, kind, &bytes)
            .await?;

        debug!(user_id = %ctx.user_id, data_id = id, %kind, size = bytes.len(), "Data stored");
        Ok(())
    }

    async fn get(&self, ctx: &AuthContext, name: &str) -> Result<StoredData, VaultError> {
        self.touch(ctx).await?;

        match self.store.get_data(ctx.user_id, name).await {
            Ok(item) => Ok(StoredData {
                kind: item.kind,
                bytes: item.bytes,
            }),
            Err(StoreError::NotFound) => Err(VaultError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_names(&self, ctx: &AuthContext) -> Result<Vec<String>, VaultError> {
        self.touch(ctx).await?;

        Ok(self.store.list_data_names(ctx.user_id).await?)
    }
}
