//! Callback failures and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use odm_auth_common::auth::{AuthorizeError, LoginError, TokenExchangeError};
use odm_auth_domain::OdmAuthError;
use thiserror::Error;
use tracing::warn;

use super::pages;
use crate::errors::InfraError;

/// Failures on `/redirect` and `/callback`, rendered as error pages.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// `code` or `state` absent from the callback.
    #[error("missing query parameter `{0}`")]
    MissingParameter(&'static str),

    /// The provider redirected back with `error=...`.
    #[error("identity provider returned {error}")]
    ProviderDenied { error: String, description: Option<String> },

    /// State mismatch or failed exchange.
    #[error(transparent)]
    Login(#[from] LoginError),

    /// Authorization URL could not be built.
    #[error("cannot start a login: {0}")]
    LoginUnavailable(#[from] AuthorizeError),
}

impl CallbackError {
    /// HTTP status for the error page.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::ProviderDenied { .. } => StatusCode::BAD_REQUEST,
            Self::Login(LoginError::StateMismatch) => StatusCode::FORBIDDEN,
            Self::Login(LoginError::TokenExchange(_)) => StatusCode::BAD_GATEWAY,
            Self::LoginUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "Invalid callback",
            Self::ProviderDenied { .. } => "Login was not completed",
            Self::Login(LoginError::StateMismatch) => "Login attempt not recognised",
            Self::Login(LoginError::TokenExchange(_)) => "Could not obtain a token",
            Self::LoginUnavailable(_) => "Login is not configured",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::MissingParameter(_) => Some(self.to_string()),
            Self::ProviderDenied { error, description } => {
                Some(description.clone().unwrap_or_else(|| error.clone()))
            }
            Self::Login(LoginError::StateMismatch) => {
                Some("Start the login again from the notebook.".to_string())
            }
            Self::Login(LoginError::TokenExchange(TokenExchangeError::Rejected { source })) => {
                Some(source.to_string())
            }
            Self::Login(LoginError::TokenExchange(_)) => {
                Some("The identity provider could not be reached.".to_string())
            }
            Self::LoginUnavailable(err) => Some(err.to_string()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "invalid_input",
            Self::ProviderDenied { .. } => "auth",
            Self::Login(err) => OdmAuthError::from(InfraError::from(err.clone())).label(),
            Self::LoginUnavailable(err) => OdmAuthError::from(InfraError::from(err.clone())).label(),
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), kind = self.kind(), error = %self, "callback failed");
        (status, Html(pages::error(self.title(), self.detail().as_deref()))).into_response()
    }
}
