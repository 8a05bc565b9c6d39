//! ID token claim decoding.
//!
//! Claims are read without verifying the signature. The token arrived over
//! TLS straight from the token endpoint; its claims are only displayed and
//! used to match the login nonce.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;

/// Failures decoding an ID token or checking its nonce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    /// Not a `header.payload.signature` token.
    #[error("token does not have three segments")]
    Malformed,

    /// Payload segment is not base64url.
    #[error("payload is not valid base64url: {0}")]
    Encoding(String),

    /// Payload does not decode to a JSON object.
    #[error("payload is not a JSON object: {0}")]
    Json(String),

    /// No `nonce` claim to compare.
    #[error("ID token has no nonce claim")]
    MissingNonce,

    /// `nonce` differs from the one sent with the login.
    #[error("ID token nonce does not match the login")]
    NonceMismatch,
}

/// Decode the payload segment of a JWT into its claims.
///
/// # Errors
/// Returns [`JwtError`] if the token is not a three segment JWT with a JSON
/// object payload.
pub fn decode_claims_unverified(token: &str) -> Result<Map<String, Value>, JwtError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(JwtError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| JwtError::Encoding(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(other) => Err(JwtError::Json(format!("expected object, found {other}"))),
        Err(e) => Err(JwtError::Json(e.to_string())),
    }
}

/// Check the `nonce` claim of an ID token.
///
/// # Errors
/// Returns [`JwtError::MissingNonce`] or [`JwtError::NonceMismatch`], or a
/// decoding error.
pub fn verify_nonce(id_token: &str, expected: &str) -> Result<(), JwtError> {
    let claims = decode_claims_unverified(id_token)?;
    match claims.get("nonce").and_then(Value::as_str) {
        None => Err(JwtError::MissingNonce),
        Some(nonce) if nonce == expected => Ok(()),
        Some(_) => Err(JwtError::NonceMismatch),
    }
}
