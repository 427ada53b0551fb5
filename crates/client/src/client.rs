//! Authenticated API client with refresh-and-retry
//!
//! Issues HTTP requests against the versioned backend API, attaches the
//! bearer access token, and recovers from an expired token by refreshing
//! once (through the session's single-flight coordinator) and replaying the
//! original request once. Requests are rebuilt from owned payloads for the
//! replay, so multipart uploads retry the same way JSON bodies do.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{multipart, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::config::ApiClientConfig;
use super::errors::ApiError;
use super::session::SessionTokens;

/// An owned file for multipart upload
///
/// Carries the bytes rather than a stream so the request can be rebuilt if
/// the first attempt is rejected with a 401.
#[derive(Debug, Clone)]
pub struct FilePart {
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl FilePart {
    /// Create a file part from owned bytes
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), mime: mime.into(), bytes }
    }

    fn to_part(&self) -> Result<multipart::Part, ApiError> {
        multipart::Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime)
            .map_err(|e| ApiError::Config(format!("invalid mime type {:?}: {e}", self.mime)))
    }
}

/// Request payload, kept in an owned form so every attempt rebuilds the
/// request identically
enum Payload {
    Empty,
    Json(serde_json::Value),
    Query(serde_json::Value),
    Multipart { field: &'static str, parts: Vec<FilePart> },
}

/// Authenticated API client
///
/// Per-request behavior: send with the current access token; on a first 401
/// refresh the token (concurrent 401s collapse into one refresh call inside
/// the session) and replay exactly once; a second 401 is terminal. Any other
/// failure is surfaced unchanged.
pub struct ApiClient {
    http: Client,
    session: Arc<dyn SessionTokens>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `session` - Token provider (normally the session manager)
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built
    pub fn new(config: ApiClientConfig, session: Arc<dyn SessionTokens>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(platform) = config.platform {
            headers.insert("X-Platform", HeaderValue::from_static(platform.as_header_value()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, session, config })
    }

    /// Create a builder for fluent configuration
    #[must_use]
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, Payload::Empty).await
    }

    /// Execute a GET request with query parameters
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self, params), fields(path = %path))]
    pub async fn get_with_params<T, P>(&self, path: &str, params: &P) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| ApiError::Config(format!("failed to serialize query params: {e}")))?;
        self.request(Method::GET, path, Payload::Query(params)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Self::json_payload(body)?).await
    }

    /// Execute a POST request without a body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self), fields(path = %path))]
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::POST, path, Payload::Empty).await
    }

    /// Execute a PUT request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Self::json_payload(body)?).await
    }

    /// Execute a PATCH request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Self::json_payload(body)?).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, Payload::Empty).await
    }

    /// Upload a single file as multipart form data
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self, file), fields(path = %path))]
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: FilePart,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Payload::Multipart { field: "file", parts: vec![file] })
            .await
    }

    /// Upload multiple files as multipart form data
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded
    #[instrument(skip(self, files), fields(path = %path, count = files.len()))]
    pub async fn upload_files<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<FilePart>,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Payload::Multipart { field: "files", parts: files })
            .await
    }

    fn json_payload<B: Serialize + ?Sized>(body: &B) -> Result<Payload, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("failed to serialize request body: {e}")))?;
        Ok(Payload::Json(body))
    }

    /// The refresh-and-retry protocol around a single logical request
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
    ) -> Result<T, ApiError> {
        let token = self.session.access_token().await;
        let response = self.send(method.clone(), path, &payload, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::decode(response).await;
        }

        debug!(path, "request rejected with 401; refreshing access token");
        let fresh = self.session.refresh_access_token(token.as_deref()).await?;

        // Exactly one replay; a second 401 is terminal so a broken refresh
        // can never loop.
        let retry = self.send(method, path, &payload, Some(&fresh)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!(path, "retried request rejected again; session expired");
            return Err(ApiError::AuthExpired);
        }

        info!(path, "request succeeded after token refresh");
        Self::decode(retry).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: &Payload,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.config.base_url, path);

        let mut request = self.http.request(method, &url);
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(body),
            Payload::Query(params) => request.query(params),
            Payload::Multipart { field, parts } => {
                let mut form = multipart::Form::new();
                for part in parts {
                    form = form.part(*field, part.to_part()?);
                }
                request.multipart(form)
            }
        };
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(|err| {
            if err.is_timeout() {
                ApiError::Timeout(self.config.timeout)
            } else {
                ApiError::Network(err.to_string())
            }
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http { status: status.as_u16(), body });
        }

        // 204/205 carry no body; decode the expected type from null
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ApiError::Parse(format!(
                    "no-content response ({}) cannot fill the expected type",
                    status.as_u16()
                ))
            });
        }

        response.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    session: Option<Arc<dyn SessionTokens>>,
}

impl ApiClientBuilder {
    /// Set the client configuration
    #[must_use]
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the token provider
    #[must_use]
    pub fn session(mut self, session: Arc<dyn SessionTokens>) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if no session is set or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let session =
            self.session.ok_or_else(|| ApiError::Config("session not set".to_string()))?;

        ApiClient::new(config, session)
    }
}
