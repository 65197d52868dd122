use axum::{
    Json,
    extract::{Path, State},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, DataResponse, EmptyResponse, NamesResponse, UploadRequest,
};
use crate::services::AuthContext;

/// POST /data
/// Store a blob under a name, replacing any previous one.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<ApiResponse<EmptyResponse>>, ApiError> {
    let bytes = STANDARD
        .decode(payload.data.as_bytes())
        .map_err(|e| ApiError::validation(format!("data is not valid base64: {e}")))?;

    state
        .vault
        .upload(&ctx, &payload.name, payload.kind, bytes)
        .await?;

    Ok(Json(ApiResponse::success(EmptyResponse {})))
}

/// GET /data/{name}
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<DataResponse>>, ApiError> {
    let stored = state.vault.get(&ctx, &name).await?;

    Ok(Json(ApiResponse::success(DataResponse {
        kind: stored.kind,
        data: STANDARD.encode(&stored.bytes),
    })))
}

/// GET /data
/// Names of the caller's blobs, oldest first.
pub async fn list_names(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<Json<ApiResponse<NamesResponse>>, ApiError> {
    let names = state.vault.list_names(&ctx).await?;

    Ok(Json(ApiResponse::success(NamesResponse { names })))
}
