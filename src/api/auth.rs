use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CredentialsRequest, LoginResponse, RegisterResponse};
use crate::constants::auth::USERNAME_TAKEN;
use crate::domain::AuthToken;
use crate::services::{AuthContext, AuthError, RegisterOutcome};

// ============================================================================
// Gate
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to the caller's identity.
///
/// Any handler that takes an [`AuthContext`] only runs for a live token.
/// Register and login don't take one and so are never gated.
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;

        let ctx = state.auth.resolve(&token).await.map_err(|e| match e {
            AuthError::Unauthenticated => {
                tracing::debug!("Rejected request with inactive token");
                ApiError::Unauthenticated
            }
            other => ApiError::from(other),
        })?;

        tracing::Span::current().record("user_id", ctx.user_id.value());

        Ok(ctx)
    }
}

/// Pulls the token out of exactly one `Authorization` header.
///
/// Missing, repeated, non-bearer or blank headers all yield `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<AuthToken> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let value = values.next()?;
    if values.next().is_some() {
        return None;
    }

    let token = value.to_str().ok()?.strip_prefix("Bearer ")?.trim();

    if token.is_empty() || token.contains(|c: char| c.is_whitespace() || c == ',') {
        return None;
    }

    Some(AuthToken::new(token))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account. A taken username is reported in the body, not as an
/// error status.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ApiError> {
    let outcome = state
        .auth
        .register(&payload.username, &payload.password)
        .await?;

    let response = match outcome {
        RegisterOutcome::Registered(token) => RegisterResponse {
            token: Some(token),
            error: None,
        },
        RegisterOutcome::UsernameTaken => RegisterResponse {
            token: None,
            error: Some(USERNAME_TAKEN.to_string()),
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

/// POST /auth/login
/// Exchange username and password for a fresh token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let token = state
        .auth
        .authenticate(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(LoginResponse { token })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(AUTHORIZATION, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn single_bearer_header_is_accepted() {
        let token = extract_bearer_token(&headers(&["Bearer abc123"])).unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn repeated_header_is_rejected() {
        assert!(extract_bearer_token(&headers(&["Bearer a", "Bearer b"])).is_none());
    }

    #[test]
    fn blank_or_foreign_schemes_are_rejected() {
        assert!(extract_bearer_token(&headers(&["Bearer "])).is_none());
        assert!(extract_bearer_token(&headers(&["Bearer    "])).is_none());
        assert!(extract_bearer_token(&headers(&["Basic dXNlcjpwdw=="])).is_none());
        assert!(extract_bearer_token(&headers(&["abc123"])).is_none());
    }

    #[test]
    fn combined_values_are_rejected() {
        assert!(extract_bearer_token(&headers(&["Bearer a, Bearer b"])).is_none());
        assert!(extract_bearer_token(&headers(&["Bearer a b"])).is_none());
    }
}
