//! Configuration structures for the identity provider and callback listener.
//!
//! These are plain data; loading from the environment lives in the infra
//! crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EXCHANGE_BACKOFF_MS, DEFAULT_HUB_URL, DEFAULT_REFRESH_LEEWAY_SECS, DEFAULT_SCOPE,
    DEFAULT_SERVICE_PATH, DEFAULT_TOKEN_PREFIX, MAX_EXCHANGE_ATTEMPTS,
};

/// Identity provider and client registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Provider base URL, e.g. `https://tenant.auth0.com`.
    pub provider_url: String,
    /// Public client id registered with the provider.
    pub client_id: String,
    /// API audience requested for the access token.
    pub audience: String,
    /// Space separated scope list.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Prefix placed before the access token in the `Authorization` header.
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
}

/// Where the listener is reachable from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSettings {
    /// External base URL of the notebook server (`JUPYTERHUB_URL`).
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
    /// Named JupyterHub server, empty for the default server.
    #[serde(default)]
    pub server_name: String,
    /// Path segment the notebook proxy maps onto the listener.
    #[serde(default = "default_service_path")]
    pub service_path: String,
    /// Local port, 0 for an ephemeral port.
    #[serde(default)]
    pub port: u16,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            server_name: String::new(),
            service_path: default_service_path(),
            port: 0,
        }
    }
}

impl ListenerSettings {
    /// A hub on localhost is a single-user server without `/user-redirect`.
    #[must_use]
    pub fn is_localhost(&self) -> bool {
        self.hub_url.contains("localhost") || self.hub_url.contains("127.0.0.1")
    }

    /// `/user-redirect/` or `/user-redirect/{server}/` for named servers.
    #[must_use]
    pub fn user_redirect_prefix(&self) -> String {
        if self.server_name.is_empty() {
            "/user-redirect/".to_string()
        } else {
            format!("/user-redirect/{}/", self.server_name)
        }
    }

    /// Base URL under which the browser reaches the notebook server.
    #[must_use]
    pub fn external_base_url(&self) -> String {
        let hub = self.hub_url.trim_end_matches('/');
        if self.is_localhost() {
            hub.to_string()
        } else {
            format!("{hub}{}", self.user_redirect_prefix().trim_end_matches('/'))
        }
    }

    /// Redirect URI registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/{}/callback", self.external_base_url(), self.service_path)
    }

    /// Login link that closes the browser window once authenticated.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/{}/redirect?path=nowhere", self.external_base_url(), self.service_path)
    }

    /// Post-login target for a notebook path (`lab/tree/<path>`), under the
    /// same prefix as [`ListenerSettings::redirect_uri`]. A path that already
    /// starts with `lab/tree/` is not prefixed twice.
    #[must_use]
    pub fn lab_tree_path(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let path = path.strip_prefix("lab/tree/").unwrap_or(path);
        if self.is_localhost() {
            format!("/lab/tree/{path}")
        } else {
            format!("{}lab/tree/{}", self.user_redirect_prefix(), path)
        }
    }
}

/// Token exchange retry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSettings {
    /// Attempts per callback, 1 to 5.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff_ms: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self { max_attempts: MAX_EXCHANGE_ATTEMPTS, backoff_ms: DEFAULT_EXCHANGE_BACKOFF_MS }
    }
}

/// Complete listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Provider registration.
    pub auth: AuthSettings,
    /// Where the listener runs and how the browser reaches it.
    #[serde(default)]
    pub listener: ListenerSettings,
    /// Token exchange retry bounds.
    #[serde(default)]
    pub exchange: ExchangeSettings,
    /// Inputs record path; `None` disables persistence.
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    /// Seconds before `expires_at` at which a token already counts as expired.
    #[serde(default = "default_refresh_leeway")]
    pub refresh_leeway_secs: i64,
}

impl Config {
    /// Build a config with defaults for everything except the provider
    /// registration.
    pub fn new(
        provider_url: impl Into<String>,
        client_id: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            auth: AuthSettings {
                provider_url: provider_url.into(),
                client_id: client_id.into(),
                audience: audience.into(),
                scope: default_scope(),
                token_prefix: default_token_prefix(),
            },
            listener: ListenerSettings::default(),
            exchange: ExchangeSettings::default(),
            input_file: None,
            refresh_leeway_secs: DEFAULT_REFRESH_LEEWAY_SECS,
        }
    }
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_token_prefix() -> String {
    DEFAULT_TOKEN_PREFIX.to_string()
}

fn default_hub_url() -> String {
    DEFAULT_HUB_URL.to_string()
}

fn default_service_path() -> String {
    DEFAULT_SERVICE_PATH.to_string()
}

fn default_refresh_leeway() -> i64 {
    DEFAULT_REFRESH_LEEWAY_SECS
}
