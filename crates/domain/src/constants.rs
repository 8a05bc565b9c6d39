//! Environment variable names and default values.

/// Identity provider base URL (no trailing slash).
pub const ENV_PROVIDER_URL: &str = "JUPYTER_OAUTH2_AUTH_PROVIDER_URL";
/// Client id registered with the identity provider.
pub const ENV_CLIENT_ID: &str = "JUPYTER_OAUTH2_API_CLIENT_ID";
/// Fallback name for the client id.
pub const ENV_CLIENT_ID_FALLBACK: &str = "JUPYTER_OAUTH2_CLIENT_ID";
/// API audience the access token is minted for.
pub const ENV_AUDIENCE: &str = "JUPYTER_OAUTH2_API_AUDIENCE";
/// Requested scopes.
pub const ENV_SCOPE: &str = "JUPYTER_OAUTH2_SCOPE";
/// Prefix of the `Authorization` header value.
pub const ENV_TOKEN_PREFIX: &str = "JUPYTER_OAUTH2_PREFIX";
/// External base URL of the notebook server.
pub const ENV_HUB_URL: &str = "JUPYTERHUB_URL";
/// Named server, empty for the default one.
pub const ENV_SERVER_NAME: &str = "JUPYTERHUB_SERVER_NAME";
/// Path the proxy serves the listener under.
pub const ENV_SERVICE_PATH: &str = "ODM_AUTH_SERVICE_PATH";
/// Inputs record shared with the kernel.
pub const ENV_INPUT_FILE: &str = "ASDC_INPUT_FILE";
/// Default project selection.
pub const ENV_DEFAULT_PROJECTS: &str = "ASDC_PROJECTS";
/// Default task selection.
pub const ENV_DEFAULT_TASKS: &str = "ASDC_TASKS";
/// Seconds before expiry that count as expired.
pub const ENV_REFRESH_LEEWAY: &str = "ODM_AUTH_REFRESH_LEEWAY";
/// Exchange attempts per callback.
pub const ENV_EXCHANGE_ATTEMPTS: &str = "ODM_AUTH_EXCHANGE_ATTEMPTS";
/// Delay between exchange attempts.
pub const ENV_EXCHANGE_BACKOFF_MS: &str = "ODM_AUTH_EXCHANGE_BACKOFF_MS";
/// TOML or JSON config file.
pub const ENV_CONFIG_FILE: &str = "ODM_AUTH_CONFIG_FILE";
/// Emit logs as JSON.
pub const ENV_LOG_JSON: &str = "ODM_AUTH_LOG_JSON";

/// `offline_access` makes the provider issue a refresh token.
pub const DEFAULT_SCOPE: &str = "openid profile email offline_access";
/// Default `Authorization` prefix.
pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer";
/// Single-user server on the default port.
pub const DEFAULT_HUB_URL: &str = "http://localhost:8888";
/// Default proxy service path.
pub const DEFAULT_SERVICE_PATH: &str = "asdc";
/// Refresh only once actually expired.
pub const DEFAULT_REFRESH_LEEWAY_SECS: i64 = 0;
/// Delay between exchange attempts.
pub const DEFAULT_EXCHANGE_BACKOFF_MS: u64 = 250;

/// Upper bound on token exchange attempts for a single callback.
pub const MAX_EXCHANGE_ATTEMPTS: u32 = 5;

/// Interval between notebook-side polls of `/tokens`.
pub const POLL_INTERVAL_MS: u64 = 250;
/// Default bound on notebook-side polling.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Value of the `path` query parameter meaning "close the window".
pub const REDIRECT_NOWHERE: &str = "nowhere";
