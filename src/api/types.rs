use serde::{Deserialize, Serialize};

use crate::domain::{AuthToken, DataKind};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Register result. A taken username comes back as `error` with no token.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<AuthToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: AuthToken,
}

/// `kind` stays a raw integer here so unknown codes reach the vault and
/// come back as a validation error instead of a JSON rejection.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    pub kind: i32,
    /// Base64 (standard alphabet, padded).
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmptyResponse {}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub kind: DataKind,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NamesResponse {
    pub names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
