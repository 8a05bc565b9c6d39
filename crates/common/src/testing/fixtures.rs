//! Test fixture generators

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};

use crate::auth::{TokenResponse, TokenSet};

/// Token set received now that expires in `expires_in` seconds.
///
/// # Examples
///
/// ```
/// use odm_auth_common::testing::fixtures::token_set;
///
/// let tokens = token_set("access", Some("refresh"), 3600);
/// assert!(!tokens.is_expired(0));
/// ```
#[must_use]
pub fn token_set(access_token: &str, refresh_token: Option<&str>, expires_in: i64) -> TokenSet {
    received(response(access_token, refresh_token, expires_in), Utc::now())
}

/// Token set that expired a minute ago.
#[must_use]
pub fn expired_token_set(access_token: &str, refresh_token: Option<&str>) -> TokenSet {
    let received_at = Utc::now() - Duration::seconds(3660);
    received(response(access_token, refresh_token, 3600), received_at)
}

#[allow(clippy::expect_used)]
fn received(response: TokenResponse, at: DateTime<Utc>) -> TokenSet {
    TokenSet::from_response(response, at).expect("fixture lifetimes are in range")
}

fn response(access_token: &str, refresh_token: Option<&str>, expires_in: i64) -> TokenResponse {
    TokenResponse {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        id_token: Some(unsigned_jwt(&serde_json::json!({
            "sub": "auth0|test-user",
            "email": "pilot@example.org",
        }))),
        token_type: "Bearer".to_string(),
        expires_in,
        scope: Some("openid profile email offline_access".to_string()),
    }
}

/// Encode `claims` as a JWT with a placeholder signature.
#[must_use]
pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.unsigned")
}

/// Token endpoint response body, as the provider would send it.
#[must_use]
pub fn token_response_json(access_token: &str, refresh_token: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access_token,
        "id_token": unsigned_jwt(&serde_json::json!({"sub": "auth0|test-user"})),
        "token_type": "Bearer",
        "expires_in": 3600,
        "scope": "openid profile email offline_access",
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = serde_json::Value::from(refresh_token);
    }
    body
}
