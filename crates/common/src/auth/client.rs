//! HTTP client for the auth endpoints
//!
//! Handles the unauthenticated entry points of the versioned backend API:
//! - Login (`POST /auth/login`)
//! - Registration (`POST /auth/register`)
//! - Token refresh (`POST /auth/refresh`, refresh token as bearer credential)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{Credentials, RegisterRequest, TokenResponse, User};

/// Error type for auth client operations
#[derive(Debug)]
pub enum AuthClientError {
    /// HTTP request failed (no usable response)
    RequestFailed(reqwest::Error),

    /// The auth endpoint rejected the request
    Rejected { status: u16, body: String },

    /// Failed to parse response
    Parse(String),

    /// No refresh token available
    NoRefreshToken,
}

impl std::fmt::Display for AuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Rejected { status, body } => write!(f, "auth endpoint returned {status}: {body}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "no refresh token available"),
        }
    }
}

impl std::error::Error for AuthClientError {}

impl From<reqwest::Error> for AuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// Backend seam for the session manager
///
/// Abstracts the auth endpoints so the session manager can be exercised with
/// counting or failing mocks in tests.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token pair
    ///
    /// # Errors
    /// Returns error if the request fails or the credentials are rejected
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, AuthClientError>;

    /// Create an account
    ///
    /// # Errors
    /// Returns error if the request fails or the registration is rejected
    async fn register(&self, request: &RegisterRequest) -> Result<User, AuthClientError>;

    /// Mint a new token pair from a refresh token
    ///
    /// # Errors
    /// Returns error if no refresh token is provided, the request fails, or
    /// the refresh token is rejected (expired, revoked)
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthClientError>;
}

/// Thin reqwest client for the auth endpoints
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new auth client against the given API base URL
    ///
    /// # Arguments
    /// * `base_url` - Versioned API base, e.g. `https://api.smarket.app/v1`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url: base_url.into() }
    }

    /// Get the configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AuthClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthClientError::Rejected { status: status.as_u16(), body });
        }

        response.json().await.map_err(|e| AuthClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, AuthClientError> {
        let url = format!("{}/auth/login", self.base_url);
        debug!(url = %url, "login request");

        let response = self.client.post(url).json(credentials).send().await?;
        Self::decode(response).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, AuthClientError> {
        let url = format!("{}/auth/register", self.base_url);
        debug!(url = %url, "register request");

        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthClientError> {
        if refresh_token.is_empty() {
            return Err(AuthClientError::NoRefreshToken);
        }

        let url = format!("{}/auth/refresh", self.base_url);
        debug!(url = %url, "refresh request");

        let response = self.client.post(url).bearer_auth(refresh_token).send().await?;
        Self::decode(response).await
    }
}
