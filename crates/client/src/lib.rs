//! Authenticated HTTP client for the SMarket backend API
//!
//! Wraps outbound calls to the versioned REST API, attaches the bearer
//! access token, and transparently recovers from a single class of failure:
//! an expired access token. A 401 triggers one token refresh (shared across
//! all concurrent requests via the session manager's single-flight
//! coordinator) and one replay of the original request with the new token.
//! Every other failure is surfaced to the caller unchanged.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use smarket_client::{ApiClient, ApiClientConfig};
//! use smarket_common::auth::{AuthClient, MemoryTokenStore, SessionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiClientConfig::default();
//! let session = Arc::new(SessionManager::new(
//!     AuthClient::new(config.base_url.clone()),
//!     Arc::new(MemoryTokenStore::new()),
//! ));
//!
//! let client = ApiClient::builder().config(config).session(session).build()?;
//! let invoices: serde_json::Value = client.get("/invoices").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod endpoints;
pub mod errors;
pub mod session;

// Re-export commonly used types
pub use client::{ApiClient, ApiClientBuilder, FilePart};
pub use config::{ApiClientConfig, Platform};
pub use endpoints::AccountEndpoints;
pub use errors::ApiError;
pub use session::SessionTokens;
