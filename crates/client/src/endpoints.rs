//! Typed wrappers for the account endpoints
//!
//! Everything else (`/invoices`, `/analysis`, `/products`, `/subscriptions`,
//! `/admin`) goes through the generic verbs on [`ApiClient`]; only the
//! account surface is common enough to deserve typed calls.

use std::sync::Arc;

use smarket_common::auth::{ProfileUpdate, User, UserProfile};
use tracing::{debug, instrument};

use super::client::ApiClient;
use super::errors::ApiError;

/// Account operations over the authenticated client
pub struct AccountEndpoints {
    client: Arc<ApiClient>,
}

impl AccountEndpoints {
    /// Create a new endpoints instance
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch the authenticated account
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let user: User = self.client.get("/auth/me").await?;
        debug!(user_id = user.id, "fetched current account");
        Ok(user)
    }

    /// Fetch the user profile
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.client.get("/users/profile").await
    }

    /// Apply a partial profile update
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.client.patch("/users/profile", update).await
    }
}
