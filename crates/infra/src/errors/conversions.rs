//! Conversions from external and flow errors into domain errors.

use odm_auth_common::auth::{
    AuthorizeError, InvalidExpiry, JwtError, LoginError, OAuthClientError, TokenExchangeError,
};
use odm_auth_domain::OdmAuthError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub OdmAuthError);

impl From<InfraError> for OdmAuthError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<OdmAuthError> for InfraError {
    fn from(value: OdmAuthError) -> Self {
        InfraError(value)
    }
}

trait IntoOdmAuthError {
    fn into_odm_auth(self) -> OdmAuthError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → OdmAuthError */
/* -------------------------------------------------------------------------- */

impl IntoOdmAuthError for HttpError {
    fn into_odm_auth(self) -> OdmAuthError {
        if self.is_timeout() {
            return OdmAuthError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return OdmAuthError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => OdmAuthError::Auth(message),
                404 => OdmAuthError::NotFound(message),
                400..=499 => OdmAuthError::InvalidInput(message),
                _ => OdmAuthError::Network(message),
            };
        }

        if self.is_decode() {
            return OdmAuthError::InvalidInput(format!("unexpected response body: {self}"));
        }

        OdmAuthError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_odm_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / io → OdmAuthError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(OdmAuthError::InvalidInput(format!("invalid JSON: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into())
    }
}

/* -------------------------------------------------------------------------- */
/* OAuth flow errors → OdmAuthError */
/* -------------------------------------------------------------------------- */

impl IntoOdmAuthError for OAuthClientError {
    fn into_odm_auth(self) -> OdmAuthError {
        match self {
            OAuthClientError::Connection(message) => OdmAuthError::Network(message),
            OAuthClientError::Config(message) => OdmAuthError::Config(message),
            other => OdmAuthError::Auth(other.to_string()),
        }
    }
}

impl From<OAuthClientError> for InfraError {
    fn from(value: OAuthClientError) -> Self {
        InfraError(value.into_odm_auth())
    }
}

impl IntoOdmAuthError for TokenExchangeError {
    fn into_odm_auth(self) -> OdmAuthError {
        match self {
            TokenExchangeError::Rejected { source } => source.into_odm_auth(),
            TokenExchangeError::RetriesExhausted { attempts, last_error } => {
                OdmAuthError::Network(format!("{last_error} (after {attempts} attempts)"))
            }
            TokenExchangeError::InvalidConfiguration(message) => OdmAuthError::Config(message),
        }
    }
}

impl From<TokenExchangeError> for InfraError {
    fn from(value: TokenExchangeError) -> Self {
        InfraError(value.into_odm_auth())
    }
}

impl From<LoginError> for InfraError {
    fn from(value: LoginError) -> Self {
        match value {
            LoginError::StateMismatch => InfraError(OdmAuthError::Security(value.to_string())),
            LoginError::TokenExchange(err) => err.into(),
        }
    }
}

impl From<AuthorizeError> for InfraError {
    fn from(value: AuthorizeError) -> Self {
        InfraError(OdmAuthError::Config(value.to_string()))
    }
}

impl From<JwtError> for InfraError {
    fn from(value: JwtError) -> Self {
        match value {
            JwtError::MissingNonce | JwtError::NonceMismatch => {
                InfraError(OdmAuthError::Security(value.to_string()))
            }
            other => InfraError(OdmAuthError::InvalidInput(format!("ID token: {other}"))),
        }
    }
}

impl From<InvalidExpiry> for InfraError {
    fn from(value: InvalidExpiry) -> Self {
        InfraError(OdmAuthError::InvalidInput(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use odm_auth_common::auth::OAuthError;
    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn convert(err: impl Into<InfraError>) -> OdmAuthError {
        let infra: InfraError = err.into();
        infra.into()
    }

    #[test]
    fn test_state_mismatch_is_a_security_error() {
        assert!(matches!(convert(LoginError::StateMismatch), OdmAuthError::Security(_)));
    }

    #[test]
    fn test_exhausted_exchange_is_a_network_error() {
        let err = TokenExchangeError::RetriesExhausted {
            attempts: 5,
            last_error: OAuthClientError::Connection("connection refused".into()),
        };

        match convert(LoginError::TokenExchange(err)) {
            OdmAuthError::Network(message) => {
                assert!(message.contains("connection refused"));
                assert!(message.contains("5 attempts"));
            }
            other => panic!("expected Network error, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_rejection_is_an_auth_error() {
        let err = TokenExchangeError::Rejected {
            source: OAuthClientError::Provider {
                status: 403,
                error: OAuthError {
                    error: "invalid_grant".into(),
                    error_description: Some("code expired".into()),
                },
            },
        };

        match convert(err) {
            OdmAuthError::Auth(message) => assert!(message.contains("invalid_grant")),
            other => panic!("expected Auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_nonce_failures_are_security_errors() {
        assert!(matches!(convert(JwtError::NonceMismatch), OdmAuthError::Security(_)));
        assert!(matches!(convert(JwtError::Malformed), OdmAuthError::InvalidInput(_)));
    }

    #[test]
    fn test_authorize_errors_are_configuration_errors() {
        assert!(matches!(convert(AuthorizeError::EmptyState), OdmAuthError::Config(_)));
    }

    #[tokio::test]
    async fn test_http_status_errors_map_by_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = Client::new()
            .get(server.uri())
            .send()
            .await
            .unwrap()
            .error_for_status()
            .unwrap_err();

        assert!(matches!(convert(err), OdmAuthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_connection_failures_are_network_errors() {
        let err = Client::new().get("http://127.0.0.1:1/").send().await.unwrap_err();
        assert!(matches!(convert(err), OdmAuthError::Network(_)));
    }
}
