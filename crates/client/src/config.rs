//! API client configuration

use std::time::Duration;

/// Platform identity advertised to the backend
///
/// Sent as the `X-Platform` header for server-side platform gating. Only the
/// admin-scoped client variant sets this; the default configuration sends no
/// platform header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Capacitor-wrapped mobile shell
    Native,
    /// Browser build
    Web,
}

impl Platform {
    /// Header value for this platform
    #[must_use]
    pub fn as_header_value(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Web => "web",
        }
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Versioned API base URL (e.g. "https://api.smarket.app/v1")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
    /// Optional platform header for server-side gating
    pub platform: Option<Platform>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.smarket.app/v1".to_string(),
            timeout: Duration::from_secs(30),
            platform: None,
        }
    }
}
