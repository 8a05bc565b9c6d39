//! OAuth 2.0 types and structures
//!
//! Token sets as held by the listener, the raw token endpoint response, the
//! provider configuration and the provider error body.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `expires_in` that does not yield a representable expiry instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expires_in of {0} seconds is out of range")]
pub struct InvalidExpiry(pub i64);

/// Access, refresh and ID tokens with locally computed expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token presented to the API
    pub access_token: String,

    /// Refresh token; absent when the provider did not issue one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (JWT) containing user claims (OpenID Connect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Usually `Bearer`.
    pub token_type: String,

    /// Access token lifetime in seconds, as reported by the provider
    pub expires_in: i64,

    /// `received_at + expires_in`, computed when the response arrived
    pub expires_at: DateTime<Utc>,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Build a token set from a token endpoint response received at
    /// `received_at`.
    ///
    /// # Errors
    /// Returns [`InvalidExpiry`] when `received_at + expires_in` overflows.
    pub fn from_response(
        response: TokenResponse,
        received_at: DateTime<Utc>,
    ) -> Result<Self, InvalidExpiry> {
        let expires_at = TimeDelta::try_seconds(response.expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            .ok_or(InvalidExpiry(response.expires_in))?;

        Ok(Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            expires_at,
            scope: response.scope,
        })
    }

    /// Expired when `now + leeway_seconds >= expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_seconds: i64) -> bool {
        match TimeDelta::try_seconds(leeway_seconds).and_then(|d| now.checked_add_signed(d)) {
            Some(deadline) => deadline >= self.expires_at,
            // A leeway past the end of time covers every expiry.
            None => leeway_seconds > 0,
        }
    }

    /// Check expiry against the current time
    #[must_use]
    pub fn is_expired(&self, leeway_seconds: i64) -> bool {
        self.is_expired_at(Utc::now(), leeway_seconds)
    }

    /// Seconds until expiry; negative once expired
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }

    /// Carry over the previous refresh token when a refresh response omits
    /// one.
    #[must_use]
    pub fn inherit_refresh_token(mut self, previous: &TokenSet) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token.clone_from(&previous.refresh_token);
        }
        self
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth token response from authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749 section 5.1).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token presented to the API
    pub access_token: String,
    /// Present when `offline_access` was granted
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// OpenID Connect ID token
    #[serde(default)]
    pub id_token: Option<String>,
    /// Defaults to `Bearer` when omitted
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds from receipt
    pub expires_in: i64,
    /// Granted scopes, when they differ from the request
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("has_id_token", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Provider registration used by the authorize URL builder and the token
/// endpoint client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Provider base URL including scheme, e.g. `https://tenant.auth0.com`
    pub provider_url: String,

    /// Public client id; no secret is used
    pub client_id: String,

    /// Redirect URI exactly as registered with the provider
    pub redirect_uri: String,

    /// Space separated scope list
    pub scope: String,

    /// API identifier the access token is minted for
    pub audience: String,
}

impl OAuthConfig {
    /// Create a new OAuth configuration
    #[must_use]
    pub fn new(
        provider_url: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            provider_url: provider_url.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
            audience: audience.into(),
        }
    }

    /// `{provider}/authorize`
    #[must_use]
    pub fn authorization_url(&self) -> String {
        format!("{}/authorize", self.provider_url.trim_end_matches('/'))
    }

    /// `{provider}/oauth/token`
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.provider_url.trim_end_matches('/'))
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 section 5.2). The same
/// shape arrives as query parameters on a failed callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthError {
    /// Error code, e.g. `invalid_grant`
    pub error: String,
    /// Human readable detail
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

/// How a token delivered by the browser relates to the login it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    /// Issued for the login carrying this nonce; the ID token must echo it.
    Fresh { nonce: String },
    /// A token the browser already held; no nonce to check.
    Reused,
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use chrono::{Duration, TimeZone};

    use super::*;

    fn response(expires_in: i64, refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "access123".to_string(),
            refresh_token: refresh.map(str::to_string),
            id_token: Some("id789".to_string()),
            token_type: "Bearer".to_string(),
            expires_in,
            scope: Some("openid profile".to_string()),
        }
    }

    /// Validates `expires_at` is derived from the receipt time.
    ///
    /// Assertions:
    /// - `expires_at` equals `received_at + expires_in`.
    /// - Expired exactly at `expires_at`, not one second before.
    #[test]
    fn test_expiry_derived_from_receipt() {
        let received_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let tokens = TokenSet::from_response(response(3600, Some("r")), received_at).unwrap();

        assert_eq!(tokens.expires_at, received_at + Duration::seconds(3600));
        assert!(!tokens.is_expired_at(received_at + Duration::seconds(3599), 0));
        assert!(tokens.is_expired_at(received_at + Duration::seconds(3600), 0));
    }

    /// Validates leeway brings expiry forward.
    #[test]
    fn test_leeway_counts_as_expired() {
        let received_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let tokens = TokenSet::from_response(response(60, None), received_at).unwrap();

        assert!(!tokens.is_expired_at(received_at, 30));
        assert!(tokens.is_expired_at(received_at + Duration::seconds(31), 30));
    }

    /// Validates lifetimes beyond the representable range are rejected.
    ///
    /// Assertions:
    /// - `i64::MAX` seconds overflows the duration itself.
    /// - A lifetime that fits a duration but not a date is also rejected.
    /// - A huge leeway counts as expired instead of overflowing.
    #[test]
    fn test_out_of_range_expiry_rejected() {
        let received_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            TokenSet::from_response(response(i64::MAX, None), received_at),
            Err(InvalidExpiry(i64::MAX))
        );
        assert_eq!(
            TokenSet::from_response(response(100_000_000_000_000, None), received_at),
            Err(InvalidExpiry(100_000_000_000_000))
        );

        let tokens = TokenSet::from_response(response(60, None), received_at).unwrap();
        assert!(tokens.is_expired_at(received_at, i64::MAX));
    }

    #[test]
    fn test_seconds_until_expiry() {
        let tokens = TokenSet::from_response(response(3600, None), Utc::now()).unwrap();
        let secs = tokens.seconds_until_expiry();
        assert!(secs > 3590 && secs <= 3600);
    }

    /// Validates that a refresh response without a refresh token keeps the
    /// previous one, and a rotated one wins.
    #[test]
    fn test_inherit_refresh_token() {
        let previous = TokenSet::from_response(response(10, Some("old")), Utc::now()).unwrap();

        let without = TokenSet::from_response(response(10, None), Utc::now()).unwrap();
        assert_eq!(without.inherit_refresh_token(&previous).refresh_token.as_deref(), Some("old"));

        let rotated = TokenSet::from_response(response(10, Some("new")), Utc::now()).unwrap();
        assert_eq!(rotated.inherit_refresh_token(&previous).refresh_token.as_deref(), Some("new"));
    }

    #[test]
    fn test_token_response_defaults() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"a","expires_in":30}"#).unwrap();
        assert_eq!(parsed.token_type, "Bearer");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.id_token.is_none());
    }

    /// Validates secrets never appear in debug output.
    #[test]
    fn test_debug_redacts_tokens() {
        let tokens =
            TokenSet::from_response(response(10, Some("refresh-secret")), Utc::now()).unwrap();
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("access123"));
        assert!(!rendered.contains("refresh-secret"));
        assert!(!rendered.contains("id789"));
    }

    #[test]
    fn test_oauth_config_urls() {
        let config = OAuthConfig::new(
            "https://dev-test.us.auth0.com/",
            "client123",
            "http://localhost:8888/asdc/callback",
            "openid profile",
            "https://odm.example.org/api",
        );

        assert_eq!(config.authorization_url(), "https://dev-test.us.auth0.com/authorize");
        assert_eq!(config.token_url(), "https://dev-test.us.auth0.com/oauth/token");
    }

    #[test]
    fn test_oauth_error_display() {
        let error = OAuthError {
            error: "invalid_grant".to_string(),
            error_description: Some("The refresh token is invalid".to_string()),
        };
        assert_eq!(error.to_string(), "invalid_grant: The refresh token is invalid");

        let bare = OAuthError { error: "invalid_request".to_string(), error_description: None };
        assert_eq!(bare.to_string(), "invalid_request");
    }
}
