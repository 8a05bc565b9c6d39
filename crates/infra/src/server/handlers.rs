//! Route handlers for the callback listener.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Utc;
use odm_auth_common::auth::{LoginHints, TokenLookup};
use odm_auth_domain::constants::REDIRECT_NOWHERE;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::error::CallbackError;
use super::pages;
use super::status::TokenStatus;
use super::AppState;

/// Query of `GET /redirect`.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectParams {
    /// Comma or space separated project ids.
    pub projects: Option<String>,
    /// Comma or space separated task ids.
    pub tasks: Option<String>,
    /// Notebook to open afterwards; `nowhere` closes the window.
    pub path: Option<String>,
}

/// Query of `GET /callback`.
#[derive(Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// State echoed by the provider.
    pub state: Option<String>,
    /// Provider error code on a failed login.
    pub error: Option<String>,
    /// Provider error detail.
    pub error_description: Option<String>,
}

/// `GET /`
pub async fn status(State(state): State<AppState>) -> Html<String> {
    let expires_at = state.service.session().tokens().map(|t| t.expires_at);
    Html(pages::status(expires_at, &state.listener.login_url()))
}

/// `GET /redirect`: start a login and send the browser to the provider.
pub async fn redirect(
    State(state): State<AppState>,
    Query(params): Query<RedirectParams>,
) -> Result<Redirect, CallbackError> {
    let redirect_path = match params.path.as_deref().map(str::trim) {
        None | Some("") | Some(REDIRECT_NOWHERE) => String::new(),
        Some(path) => state.listener.lab_tree_path(path),
    };
    let hints = LoginHints::parse(
        params.projects.as_deref().unwrap_or_default(),
        params.tasks.as_deref().unwrap_or_default(),
    );

    debug!(redirect = %redirect_path, projects = hints.projects.len(), tasks = hints.tasks.len(), "login requested");
    let url = state.service.begin_login(redirect_path, hints)?;
    Ok(Redirect::to(&url))
}

/// `GET /callback`: finish the login the provider redirected back from.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, CallbackError> {
    if let Some(error) = params.error {
        return Err(CallbackError::ProviderDenied { error, description: params.error_description });
    }
    let code = params.code.filter(|c| !c.is_empty()).ok_or(CallbackError::MissingParameter("code"))?;
    let received_state =
        params.state.filter(|s| !s.is_empty()).ok_or(CallbackError::MissingParameter("state"))?;

    let login = state.service.complete_login(&code, &received_state).await?;

    if let Err(err) = state.inputs.record_login(state.port, &login.hints).await {
        warn!(error = %err, "failed to update inputs record");
    }

    if login.redirect_path.is_empty() {
        info!(port = state.port, "login complete, closing window");
        Ok(Html(pages::close_window()).into_response())
    } else {
        info!(port = state.port, redirect = %login.redirect_path, "login complete, redirecting");
        Ok(Redirect::to(&login.redirect_path).into_response())
    }
}

/// `GET /tokens`: current tokens for the notebook, refreshed when expired.
pub async fn tokens(State(state): State<AppState>) -> Response {
    match state.service.get_token().await {
        TokenLookup::Available(tokens) => {
            let leeway = state.service.token_manager().leeway_seconds();
            Json(TokenStatus::from_tokens(&tokens, Utc::now(), leeway)).into_response()
        }
        TokenLookup::AuthRequired => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "auth_required",
                "login_url": state.listener.login_url(),
            })),
        )
            .into_response(),
    }
}
