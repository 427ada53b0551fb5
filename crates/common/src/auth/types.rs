//! Credential and account wire types
//!
//! Request and response shapes for the `/auth` and `/users` endpoints, plus
//! the [`TokenPair`] that represents the persisted session credentials.

use serde::{Deserialize, Serialize};

/// The persisted credential pair for one authenticated session
///
/// Created on login or registration, replaced wholesale on every successful
/// refresh (both values rotate together), and deleted on logout or refresh
/// failure. Exactly one pair exists per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential attached to API calls
    pub access_token: String,

    /// Longer-lived credential used solely to mint new access tokens
    pub refresh_token: String,
}

/// Token response from the auth endpoints
///
/// Shape of the `POST /auth/login` and `POST /auth/refresh` responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Newly minted access token
    pub access_token: String,

    /// Newly minted refresh token
    pub refresh_token: String,

    /// Token scheme, always `"bearer"`
    pub token_type: String,
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        Self { access_token: response.access_token, refresh_token: response.refresh_token }
    }
}

/// Login request body for `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Account email address
    pub email: String,

    /// Account password, sent in clear over TLS
    pub password: String,
}

/// Registration request body for `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Email address for the new account
    pub email: String,

    /// Password for the new account
    pub password: String,

    /// Display name for the new account
    pub full_name: String,
}

/// Account payload returned by `POST /auth/register` and `GET /auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned account identifier
    pub id: i64,

    /// Account email address
    pub email: String,

    /// Account display name
    pub full_name: String,
}

/// Profile payload for `GET /users/profile`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account email address
    pub email: String,

    /// Account display name
    pub full_name: String,

    /// Contact phone number, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Avatar image URL, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Partial update body for `PATCH /users/profile`
///
/// Only the populated fields are sent; the backend leaves the rest untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    /// New display name, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// New phone number, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    /// Validates the token response conversion scenario.
    ///
    /// Assertions:
    /// - Confirms `pair.access_token` equals `"access-1"`.
    /// - Confirms `pair.refresh_token` equals `"refresh-1"`.
    #[test]
    fn test_token_response_conversion() {
        let response = TokenResponse {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            token_type: "bearer".to_string(),
        };

        let pair: TokenPair = response.into();

        assert_eq!(pair.access_token, "access-1");
        assert_eq!(pair.refresh_token, "refresh-1");
    }

    /// Validates the token pair serde round trip scenario.
    #[test]
    fn test_token_pair_round_trip() {
        let pair = TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        };

        let json = serde_json::to_string(&pair).unwrap();
        let decoded: TokenPair = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, pair);
    }

    /// Validates that `ProfileUpdate` omits unset fields.
    #[test]
    fn test_profile_update_skips_empty_fields() {
        let update = ProfileUpdate { full_name: Some("Ana Silva".to_string()), phone: None };

        let json = serde_json::to_string(&update).unwrap();

        assert!(json.contains("full_name"));
        assert!(!json.contains("phone"));
    }

    /// Validates that `TokenResponse` decodes the documented wire shape.
    #[test]
    fn test_token_response_decoding() {
        let json = r#"{"access_token":"a","refresh_token":"r","token_type":"bearer"}"#;

        let response: TokenResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.access_token, "a");
        assert_eq!(response.refresh_token, "r");
        assert_eq!(response.token_type, "bearer");
    }
}
