//! Token provider seam for the API client
//!
//! The API client does not talk to storage or the auth endpoints directly;
//! it resolves and refreshes tokens through [`SessionTokens`]. This keeps the
//! request surface testable with mock providers and keeps the session
//! manager the single writer of the credential pair.

use async_trait::async_trait;
use smarket_common::auth::{AuthBackend, SessionManager, TokenStore};

use super::errors::ApiError;

/// Trait for resolving and refreshing access tokens
#[async_trait]
pub trait SessionTokens: Send + Sync {
    /// Current access token, if a session exists
    ///
    /// `None` is allowed: the request goes out unauthenticated and the
    /// backend's 401 routes it into the refresh path.
    async fn access_token(&self) -> Option<String>;

    /// Obtain a fresh access token after a 401
    ///
    /// `stale` is the token the rejected request carried, letting the
    /// session deduplicate refreshes that already happened.
    ///
    /// # Errors
    /// Returns [`ApiError::AuthExpired`] if the session cannot be restored
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, ApiError>;
}

#[async_trait]
impl<B, S> SessionTokens for SessionManager<B, S>
where
    B: AuthBackend + 'static,
    S: TokenStore + 'static,
{
    async fn access_token(&self) -> Option<String> {
        SessionManager::access_token(self).await
    }

    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, ApiError> {
        SessionManager::refresh_access_token(self, stale).await.map_err(ApiError::from)
    }
}
