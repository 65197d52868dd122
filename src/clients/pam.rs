//! Typed HTTP client for a running pam server.
//!
//! Holds the current token after `register`/`authenticate` and sends it on
//! every data call.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::api::{
    ApiResponse, CredentialsRequest, DataResponse, EmptyResponse, LoginResponse, NamesResponse,
    RegisterResponse, UploadRequest,
};
use crate::domain::{AuthToken, DataKind};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("username is taken")]
    UsernameTaken,

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("data does not exist")]
    DataDoesNotExist,

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub struct PamClient {
    client: Client,
    base_url: Url,
    token: RwLock<Option<AuthToken>>,
}

impl PamClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8090`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("pam/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            token: RwLock::new(None),
        })
    }

    pub async fn token(&self) -> Option<AuthToken> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: AuthToken) {
        *self.token.write().await = Some(token);
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidResponse("base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AuthToken, ClientError> {
        let url = self.endpoint(&["auth", "register"])?;
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: RegisterResponse = self.send(self.client.post(url).json(&body)).await?;

        match (response.token, response.error) {
            (Some(token), _) => {
                self.set_token(token.clone()).await;
                Ok(token)
            }
            (None, Some(_)) => Err(ClientError::UsernameTaken),
            (None, None) => Err(ClientError::InvalidResponse(
                "register returned neither token nor error".to_string(),
            )),
        }
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthToken, ClientError> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse = self
            .send(self.client.post(url).json(&body))
            .await
            .map_err(|e| match e {
                ClientError::DataDoesNotExist => ClientError::WrongCredentials,
                other => other,
            })?;

        self.set_token(response.token.clone()).await;
        Ok(response.token)
    }

    pub async fn upload(&self, name: &str, kind: DataKind, bytes: &[u8]) -> Result<(), ClientError> {
        let url = self.endpoint(&["data"])?;
        let body = UploadRequest {
            name: name.to_string(),
            kind: kind.code(),
            data: STANDARD.encode(bytes),
        };

        let _: EmptyResponse = self.send_authed(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<(DataKind, Vec<u8>), ClientError> {
        let url = self.endpoint(&["data", name])?;

        let response: DataResponse = self.send_authed(self.client.get(url)).await?;
        let bytes = STANDARD
            .decode(response.data.as_bytes())
            .map_err(|e| ClientError::InvalidResponse(format!("bad base64 payload: {e}")))?;

        Ok((response.kind, bytes))
    }

    pub async fn list(&self) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(&["data"])?;

        let response: NamesResponse = self.send_authed(self.client.get(url)).await?;
        Ok(response.names)
    }

    async fn send_authed<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let token = self.token().await.ok_or(ClientError::Unauthenticated)?;
        self.send(request.bearer_auth(token.as_str())).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "pam response");

        let body: ApiResponse<T> = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => ApiResponse::error(status.to_string()),
        };

        if status.is_success() {
            return body.data.ok_or_else(|| {
                ClientError::InvalidResponse("successful response without data".to_string())
            });
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthenticated,
            StatusCode::NOT_FOUND => ClientError::DataDoesNotExist,
            _ => ClientError::Server {
                status: status.as_u16(),
                message: body.error.unwrap_or_default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_built_under_api() {
        let client = PamClient::new("http://localhost:8090").unwrap();
        assert_eq!(
            client.endpoint(&["auth", "login"]).unwrap().as_str(),
            "http://localhost:8090/api/auth/login"
        );
    }

    #[test]
    fn data_names_are_percent_encoded() {
        let client = PamClient::new("http://localhost:8090/").unwrap();
        assert_eq!(
            client.endpoint(&["data", "my note/1"]).unwrap().as_str(),
            "http://localhost:8090/api/data/my%20note%2F1"
        );
    }
}
