//! Session manager with single-flight token refresh
//!
//! Owns the credential pair lifecycle:
//! - Login/registration persist the pair through the [`TokenStore`]
//! - Refresh rotates both tokens, coordinated so concurrent callers share
//!   one in-flight refresh (at most one refresh request on the wire)
//! - Refresh failure clears the pair and broadcasts
//!   [`SessionEvent::Unauthenticated`] for the rest of the application

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use super::client::AuthBackend;
use super::storage::TokenStore;
use super::types::{Credentials, RegisterRequest, TokenPair, User};

/// Error type for session operations
///
/// `Clone` because refresh results are fanned out to every waiter of the
/// shared in-flight refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No session or no refresh token; re-authentication required
    NotAuthenticated,

    /// Login or registration was rejected
    Auth(String),

    /// The refresh endpoint rejected the refresh token or was unreachable
    RefreshFailed(String),

    /// Token storage failed
    Storage(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Self::RefreshFailed(msg) => write!(f, "token refresh failed: {msg}"),
            Self::Storage(msg) => write!(f, "token storage error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Session lifecycle notifications
///
/// Consumed elsewhere in the application to drop cached data and navigate
/// to the login screen. Broadcast, never a hard redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session can no longer be restored; credentials were cleared
    Unauthenticated,
}

type RefreshFuture = Shared<BoxFuture<'static, Result<String, SessionError>>>;

/// Session manager coordinating credentials and token refresh
///
/// Process-wide shared mutable state (the credential pair and the pending
/// refresh handle) lives here and nowhere else. The refresh coordinator is
/// a two-state machine: `Idle` (no pending future) and `RefreshInFlight`
/// (a shared future is published). Callers check-and-attach under the
/// `pending` mutex instead of racing independent refreshes.
pub struct SessionManager<B: AuthBackend + 'static, S: TokenStore + 'static> {
    backend: Arc<B>,
    store: Arc<S>,
    pending: Arc<Mutex<Option<RefreshFuture>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl<B: AuthBackend + 'static, S: TokenStore + 'static> SessionManager<B, S> {
    /// Create a new session manager
    ///
    /// # Arguments
    /// * `backend` - Auth endpoint client used for login and refresh
    /// * `store` - Credential storage backend
    #[must_use]
    pub fn new(backend: B, store: Arc<S>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { backend: Arc::new(backend), store, pending: Arc::new(Mutex::new(None)), events }
    }

    /// Subscribe to session lifecycle events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Log in and persist the resulting credential pair
    ///
    /// # Errors
    /// Returns error if the credentials are rejected or storage fails
    pub async fn login(&self, credentials: &Credentials) -> Result<(), SessionError> {
        let response = self
            .backend
            .login(credentials)
            .await
            .map_err(|e| SessionError::Auth(e.to_string()))?;

        self.store_tokens(&TokenPair::from(response)).await?;
        info!("session established");
        Ok(())
    }

    /// Register an account and establish a session for it
    ///
    /// The registration endpoint returns the account, not tokens, so the
    /// session is established with a follow-up login using the same
    /// credentials.
    ///
    /// # Errors
    /// Returns error if registration or the follow-up login fails
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
        let user = self
            .backend
            .register(request)
            .await
            .map_err(|e| SessionError::Auth(e.to_string()))?;

        let credentials =
            Credentials { email: request.email.clone(), password: request.password.clone() };
        self.login(&credentials).await?;

        Ok(user)
    }

    /// Persist a credential pair, replacing any previous pair
    ///
    /// # Errors
    /// Returns error if storage fails
    pub async fn store_tokens(&self, tokens: &TokenPair) -> Result<(), SessionError> {
        self.store.store(tokens).await.map_err(SessionError::Storage)
    }

    /// Log out, deleting the credential pair
    ///
    /// # Errors
    /// Returns error if storage fails
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await.map_err(SessionError::Storage)?;
        info!("session cleared (logged out)");
        Ok(())
    }

    /// Get the current access token, if any
    ///
    /// Storage failures read as "no token": the request then goes out
    /// unauthenticated and the resulting 401 routes the caller into the
    /// refresh path, which reports storage errors properly.
    pub async fn access_token(&self) -> Option<String> {
        match self.store.load().await {
            Ok(pair) => pair.map(|p| p.access_token),
            Err(err) => {
                debug!(error = %err, "token storage read failed");
                None
            }
        }
    }

    /// Check if a session is persisted
    pub async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    /// Refresh the access token, sharing one in-flight refresh among all
    /// concurrent callers
    ///
    /// `stale` is the access token the caller used for the request that got
    /// the 401. If the stored token already differs, a concurrent refresh
    /// rotated the pair while this caller was in flight; the rotated token
    /// is returned without touching the network.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthenticated`] if no refresh token is stored
    ///   (no endpoint call is made)
    /// - [`SessionError::RefreshFailed`] if the refresh endpoint rejects the
    ///   refresh token; credentials are cleared and
    ///   [`SessionEvent::Unauthenticated`] is broadcast exactly once
    /// - [`SessionError::Storage`] if the store cannot be read or written
    pub async fn refresh_access_token(
        &self,
        stale: Option<&str>,
    ) -> Result<String, SessionError> {
        if let Some(stale) = stale {
            let stored = self.store.load().await.map_err(SessionError::Storage)?;
            if let Some(pair) = stored {
                if pair.access_token != stale {
                    debug!("token already rotated by a concurrent refresh");
                    return Ok(pair.access_token);
                }
            }
        }

        let refresh = {
            let mut pending = self.pending.lock().await;
            match pending.as_ref() {
                Some(inflight) => {
                    debug!("attaching to in-flight token refresh");
                    inflight.clone()
                }
                None => {
                    let future = Self::run_refresh(
                        Arc::clone(&self.backend),
                        Arc::clone(&self.store),
                        self.events.clone(),
                        Arc::clone(&self.pending),
                    )
                    .boxed()
                    .shared();
                    *pending = Some(future.clone());
                    future
                }
            }
        };

        refresh.await
    }

    /// Drive one refresh and retire the coordinator slot before resolving,
    /// so no caller can attach to an already-completed refresh.
    async fn run_refresh(
        backend: Arc<B>,
        store: Arc<S>,
        events: broadcast::Sender<SessionEvent>,
        pending: Arc<Mutex<Option<RefreshFuture>>>,
    ) -> Result<String, SessionError> {
        let result = Self::execute_refresh(backend, store, events).await;
        *pending.lock().await = None;
        result
    }

    async fn execute_refresh(
        backend: Arc<B>,
        store: Arc<S>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<String, SessionError> {
        let refresh_token = match store.load().await.map_err(SessionError::Storage)? {
            Some(pair) if !pair.refresh_token.is_empty() => pair.refresh_token,
            _ => {
                warn!("no refresh token available; signing out");
                let _ = store.clear().await;
                let _ = events.send(SessionEvent::Unauthenticated);
                return Err(SessionError::NotAuthenticated);
            }
        };

        match backend.refresh(&refresh_token).await {
            Ok(response) => {
                let pair = TokenPair::from(response);
                store.store(&pair).await.map_err(SessionError::Storage)?;
                info!("access token refreshed");
                Ok(pair.access_token)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed; clearing session");
                let _ = store.clear().await;
                let _ = events.send(SessionEvent::Unauthenticated);
                Err(SessionError::RefreshFailed(err.to_string()))
            }
        }
    }
}
