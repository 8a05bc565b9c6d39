//! Per-process login session and token store.
//!
//! One [`AuthSession`] exists per listener. It holds the PKCE pair and state
//! of the most recent login attempt, where to send the browser afterwards,
//! the selection hints that came with the attempt, and the current tokens.
//! All state sits behind a single mutex that is never held across an await.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pkce::{generate_state, validate_state, PkcePair};
use super::types::TokenSet;

/// Project and task selection passed along with a login attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginHints {
    /// Project ids to preselect in the notebook.
    pub projects: Vec<u64>,
    /// Task ids to preselect in the notebook.
    pub tasks: Vec<String>,
}

impl LoginHints {
    /// Parse the raw `projects` and `tasks` query values.
    ///
    /// Projects are integers separated by any non-word characters; tokens that
    /// are not integers are skipped. Tasks are separated by commas or spaces.
    #[must_use]
    pub fn parse(projects: &str, tasks: &str) -> Self {
        let projects = projects
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        let tasks = tasks
            .split([',', ' '])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { projects, tasks }
    }

    /// No projects and no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.tasks.is_empty()
    }
}

/// What the authorization URL for a new attempt needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    /// S256 challenge for the authorization URL.
    pub code_challenge: String,
    /// State value the callback must echo.
    pub state: String,
}

/// Copied out of the session once the callback state checks out.
#[derive(Clone)]
pub struct VerifiedCallback {
    /// Verifier matching the login's challenge.
    pub code_verifier: String,
    /// Where to send the browser afterwards; empty closes the window.
    pub redirect_path: String,
    /// Selection hints given when the login started.
    pub hints: LoginHints,
}

impl std::fmt::Debug for VerifiedCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifiedCallback")
            .field("redirect_path", &self.redirect_path)
            .field("hints", &self.hints)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct SessionState {
    pkce: PkcePair,
    state: String,
    redirect_path: String,
    hints: LoginHints,
    tokens: Option<TokenSet>,
}

/// Login session shared by the HTTP handlers.
#[derive(Debug)]
pub struct AuthSession {
    audience: String,
    server_name: String,
    inner: Mutex<SessionState>,
}

impl AuthSession {
    /// Create a session with a fresh PKCE pair and state and no tokens.
    #[must_use]
    pub fn new(audience: impl Into<String>, server_name: impl Into<String>) -> Self {
        let audience = audience.into();
        let server_name = server_name.into();
        let state = generate_state(&audience, &server_name, Utc::now().timestamp());
        Self {
            audience,
            server_name,
            inner: Mutex::new(SessionState {
                pkce: PkcePair::generate(),
                state,
                redirect_path: String::new(),
                hints: LoginHints::default(),
                tokens: None,
            }),
        }
    }

    /// Start a new login attempt, replacing any previous one.
    ///
    /// The PKCE pair and state are regenerated together so the challenge
    /// handed out here always belongs to the verifier used at exchange time.
    pub fn begin(&self, redirect_path: String, hints: LoginHints) -> LoginAttempt {
        let pkce = PkcePair::generate();
        let state = generate_state(&self.audience, &self.server_name, Utc::now().timestamp());
        let attempt =
            LoginAttempt { code_challenge: pkce.challenge().to_string(), state: state.clone() };

        let mut inner = self.inner.lock();
        inner.pkce = pkce;
        inner.state = state;
        inner.redirect_path = redirect_path;
        inner.hints = hints;
        debug!(state_len = attempt.state.len(), "login attempt started");
        attempt
    }

    /// Check the state returned on the callback.
    ///
    /// Returns `None` on mismatch; nothing in the session changes either way.
    #[must_use]
    pub fn verify_state(&self, received: &str) -> Option<VerifiedCallback> {
        let inner = self.inner.lock();
        if !validate_state(&inner.state, received) {
            return None;
        }
        Some(VerifiedCallback {
            code_verifier: inner.pkce.verifier().to_string(),
            redirect_path: inner.redirect_path.clone(),
            hints: inner.hints.clone(),
        })
    }

    /// Current state value, for the authorization URL of the initial attempt.
    #[must_use]
    pub fn current_attempt(&self) -> LoginAttempt {
        let inner = self.inner.lock();
        LoginAttempt {
            code_challenge: inner.pkce.challenge().to_string(),
            state: inner.state.clone(),
        }
    }

    /// Redirect path of the pending login.
    #[must_use]
    pub fn redirect_path(&self) -> String {
        self.inner.lock().redirect_path.clone()
    }

    /// Hints of the pending login.
    #[must_use]
    pub fn hints(&self) -> LoginHints {
        self.inner.lock().hints.clone()
    }

    /// Copy of the held tokens.
    #[must_use]
    pub fn tokens(&self) -> Option<TokenSet> {
        self.inner.lock().tokens.clone()
    }

    /// Replace the held tokens.
    pub fn store_tokens(&self, tokens: TokenSet) {
        self.inner.lock().tokens = Some(tokens);
    }

    /// Replace the tokens only if the current access token is still
    /// `expected_access_token`. Returns whether the swap happened.
    pub fn replace_tokens_if(&self, expected_access_token: &str, tokens: TokenSet) -> bool {
        let mut inner = self.inner.lock();
        match inner.tokens.as_ref() {
            Some(current) if current.access_token == expected_access_token => {
                inner.tokens = Some(tokens);
                true
            }
            _ => false,
        }
    }

    /// Forget the held tokens.
    pub fn clear_tokens(&self) {
        self.inner.lock().tokens = None;
    }
}
