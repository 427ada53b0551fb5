//! Session and credential management
//!
//! Owns the credential pair lifecycle for an authenticated SMarket session:
//!
//! ```text
//! ┌──────────────────┐
//! │  SessionManager  │  Credential lifecycle + refresh coordination
//! └────────┬─────────┘
//!          │
//!          ├──► AuthBackend  (login / register / refresh HTTP calls)
//!          │         └──► AuthClient (reqwest implementation)
//!          │
//!          └──► TokenStore   (pluggable credential storage)
//! ```
//!
//! The session manager is the only writer of the credential pair. Everything
//! else reads the access token through it and reacts to the
//! [`SessionEvent::Unauthenticated`] broadcast when the session dies.
//!
//! # Module Organization
//!
//! - **[`types`]**: Credential wire types (`TokenPair`, `TokenResponse`, ...)
//! - **[`storage`]**: `TokenStore` trait with in-memory and file-backed stores
//! - **[`client`]**: HTTP client for the auth endpoints
//! - **[`session`]**: `SessionManager` with single-flight token refresh

pub mod client;
pub mod session;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use client::{AuthBackend, AuthClient, AuthClientError};
pub use session::{SessionError, SessionEvent, SessionManager};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::{Credentials, ProfileUpdate, RegisterRequest, TokenPair, TokenResponse, User, UserProfile};
