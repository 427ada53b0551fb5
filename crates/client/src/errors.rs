//! API client error types
//!
//! The taxonomy callers see: HTTP rejections propagated verbatim, transport
//! failures, and the terminal `AuthExpired` produced when the
//! refresh-and-retry protocol cannot restore the session.

use std::time::Duration;

use smarket_common::auth::SessionError;
use thiserror::Error;

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Any non-2xx, non-401 response; propagated to the caller unchanged
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The session could not be restored: refresh failed, no refresh token
    /// was available, or the retried request was rejected again
    #[error("session expired; re-authentication required")]
    AuthExpired,

    /// Transport-level failure, no response received
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A 2xx response whose body could not be decoded
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Client construction, request assembly, or local token storage failed
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the rejected response, if this is an HTTP error
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check whether this error signals a dead session
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }
}

/// Auth-side session failures mean the request could not be
/// re-authenticated: the session manager has already cleared credentials and
/// broadcast the unauthenticated signal. Storage failures are local faults
/// where nothing was cleared, so they do not read as an expired session.
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Storage(msg) => Self::Config(format!("token storage: {msg}")),
            SessionError::NotAuthenticated
            | SessionError::Auth(_)
            | SessionError::RefreshFailed(_) => Self::AuthExpired,
        }
    }
}
