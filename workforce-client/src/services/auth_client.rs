//! HTTP client for the backend's authentication endpoints.

use crate::config::ApiSettings;
use crate::models::User;
use async_trait::async_trait;
use client_core::error::{error_for_status, ApiError};
use client_core::observability::TracedClientExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body sent to `POST /register`.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// `/roles/permissions` answers with a bare list; some deployments wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PermissionsPayload {
    List(Option<Vec<String>>),
    Wrapped { permissions: Option<Vec<String>> },
}

impl PermissionsPayload {
    fn into_tags(self) -> Vec<String> {
        match self {
            PermissionsPayload::List(tags) | PermissionsPayload::Wrapped { permissions: tags } => {
                tags.unwrap_or_default()
            }
        }
    }
}

/// Authentication calls against the backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn fetch_profile(&self, token: &str) -> Result<User, ApiError>;

    /// Permission tags of the token's user; empty when the server has none.
    async fn fetch_permissions(&self, token: &str) -> Result<Vec<String>, ApiError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, ApiError>;

    /// Returns the server's confirmation message.
    async fn forgot_password(&self, email: &str) -> Result<String, ApiError>;
}

pub struct AuthClient {
    client: Client,
    settings: ApiSettings,
}

impl AuthClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self { client, settings })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = error_for_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.url("/login");

        let response = self
            .client
            .traced_post(&url)
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send login request to {}: {}", url, e);
                ApiError::Transport(e)
            })?;

        Self::decode(response).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<User, ApiError> {
        let response = self
            .client
            .traced_get(&self.url("/profile"))
            .bearer_auth(token)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn fetch_permissions(&self, token: &str) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .traced_get(&self.url("/roles/permissions"))
            .bearer_auth(token)
            .send()
            .await?;

        let body = error_for_status(response).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload: PermissionsPayload = serde_json::from_str(&body)?;
        Ok(payload.into_tags())
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, ApiError> {
        let response = self
            .client
            .traced_post(&self.url("/register"))
            .json(request)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .traced_post(&self.url("/forgot-password"))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        let body: MessageResponse = Self::decode(response).await?;
        Ok(body.message)
    }
}
