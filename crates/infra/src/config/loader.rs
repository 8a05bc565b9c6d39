//! Configuration loader
//!
//! Loads listener configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads `~/.env` and `./.env` into the process environment (existing
//!    variables win)
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to the file named by `ODM_AUTH_CONFIG_FILE`,
//!    or the first file found by [`probe_config_paths`]
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `JUPYTER_OAUTH2_AUTH_PROVIDER_URL`: identity provider base URL (required)
//! - `JUPYTER_OAUTH2_API_CLIENT_ID`: client id (required; falls back to
//!   `JUPYTER_OAUTH2_CLIENT_ID`)
//! - `JUPYTER_OAUTH2_API_AUDIENCE`: API audience (required)
//! - `JUPYTER_OAUTH2_SCOPE`: scope list
//! - `JUPYTER_OAUTH2_PREFIX`: `Authorization` header prefix
//! - `JUPYTERHUB_URL`: external base URL of the notebook server
//! - `JUPYTERHUB_SERVER_NAME`: named JupyterHub server
//! - `ODM_AUTH_SERVICE_PATH`: proxy path mapped onto the listener
//! - `ASDC_INPUT_FILE`: inputs record path
//! - `ODM_AUTH_REFRESH_LEEWAY`: expiry leeway in seconds
//! - `ODM_AUTH_EXCHANGE_ATTEMPTS`: token exchange attempts (1..=5)
//! - `ODM_AUTH_EXCHANGE_BACKOFF_MS`: pause between exchange attempts

use std::path::{Path, PathBuf};
use std::str::FromStr;

use odm_auth_common::auth::OAuthConfig;
use odm_auth_domain::constants::{
    DEFAULT_EXCHANGE_BACKOFF_MS, DEFAULT_REFRESH_LEEWAY_SECS, ENV_AUDIENCE, ENV_CLIENT_ID,
    ENV_CLIENT_ID_FALLBACK, ENV_CONFIG_FILE, ENV_EXCHANGE_ATTEMPTS, ENV_EXCHANGE_BACKOFF_MS,
    ENV_HUB_URL, ENV_INPUT_FILE, ENV_PROVIDER_URL, ENV_REFRESH_LEEWAY, ENV_SCOPE,
    ENV_SERVER_NAME, ENV_SERVICE_PATH, ENV_TOKEN_PREFIX, MAX_EXCHANGE_ATTEMPTS,
};
use odm_auth_domain::{Config, ExchangeSettings, OdmAuthError, Result};

/// Load configuration with automatic fallback strategy
///
/// Reads `.env` files first, then attempts to load from environment
/// variables. If any required variable is missing, falls back to a config
/// file.
///
/// # Errors
/// Returns `OdmAuthError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or out of range
pub fn load() -> Result<Config> {
    load_dotenv();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            let path = std::env::var_os(ENV_CONFIG_FILE).map(PathBuf::from);
            load_from_file(path).map_err(|file_err| {
                // The environment error names the missing variable; keep it.
                if path_was_probed(&file_err) {
                    e
                } else {
                    file_err
                }
            })
        }
    }
}

/// Read `~/.env` and `./.env` into the process environment.
///
/// Variables already set are never overwritten, so the real environment
/// takes precedence over either file. Missing files are ignored.
pub fn load_dotenv() {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".env");
        if dotenvy::from_path(&path).is_ok() {
            tracing::debug!(path = %path.display(), "Loaded .env from home directory");
        }
    }

    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env from working directory");
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `OdmAuthError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary variable lookup.
///
/// Empty values count as unset.
///
/// # Errors
/// Same as [`load_from_env`].
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let provider_url = required(&get, ENV_PROVIDER_URL)?;
    let client_id = get(ENV_CLIENT_ID).or_else(|| get(ENV_CLIENT_ID_FALLBACK)).ok_or_else(|| {
        OdmAuthError::Config(format!(
            "Missing required environment variable: {ENV_CLIENT_ID} (or {ENV_CLIENT_ID_FALLBACK})"
        ))
    })?;
    let audience = required(&get, ENV_AUDIENCE)?;

    let mut config = Config::new(provider_url, client_id, audience);

    if let Some(scope) = get(ENV_SCOPE) {
        config.auth.scope = scope;
    }
    if let Some(prefix) = get(ENV_TOKEN_PREFIX) {
        config.auth.token_prefix = prefix;
    }
    if let Some(hub_url) = get(ENV_HUB_URL) {
        config.listener.hub_url = hub_url;
    }
    if let Some(server_name) = get(ENV_SERVER_NAME) {
        config.listener.server_name = server_name;
    }
    if let Some(service_path) = get(ENV_SERVICE_PATH) {
        config.listener.service_path = service_path.trim_matches('/').to_string();
    }
    config.input_file = get(ENV_INPUT_FILE).map(PathBuf::from);

    config.refresh_leeway_secs =
        parsed(&get, ENV_REFRESH_LEEWAY, DEFAULT_REFRESH_LEEWAY_SECS)?;
    config.exchange = ExchangeSettings {
        max_attempts: parsed(&get, ENV_EXCHANGE_ATTEMPTS, MAX_EXCHANGE_ATTEMPTS)?,
        backoff_ms: parsed(&get, ENV_EXCHANGE_BACKOFF_MS, DEFAULT_EXCHANGE_BACKOFF_MS)?,
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `OdmAuthError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing or out of range
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(OdmAuthError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| OdmAuthError::Config(NO_CONFIG_FILE.into()))?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| OdmAuthError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Check the fields a listener cannot start without.
///
/// # Errors
/// Returns `OdmAuthError::Config` naming the first problem found.
pub fn validate(config: &Config) -> Result<()> {
    let auth = &config.auth;
    for (name, value) in [
        ("provider_url", &auth.provider_url),
        ("client_id", &auth.client_id),
        ("audience", &auth.audience),
    ] {
        if value.trim().is_empty() {
            return Err(OdmAuthError::Config(format!("{name} must not be empty")));
        }
    }

    if !auth.provider_url.starts_with("http://") && !auth.provider_url.starts_with("https://") {
        return Err(OdmAuthError::Config(format!(
            "provider_url must be an http(s) URL, got {}",
            auth.provider_url
        )));
    }

    let attempts = config.exchange.max_attempts;
    if attempts == 0 || attempts > MAX_EXCHANGE_ATTEMPTS {
        return Err(OdmAuthError::Config(format!(
            "exchange attempts must be between 1 and {MAX_EXCHANGE_ATTEMPTS}, got {attempts}"
        )));
    }

    if config.refresh_leeway_secs < 0 {
        return Err(OdmAuthError::Config("refresh leeway must not be negative".into()));
    }

    Ok(())
}

/// Provider settings for the OAuth flow, with the redirect URI derived from
/// the listener settings.
#[must_use]
pub fn oauth_config(config: &Config) -> OAuthConfig {
    OAuthConfig::new(
        config.auth.provider_url.trim_end_matches('/'),
        config.auth.client_id.clone(),
        config.listener.redirect_uri(),
        config.auth.scope.clone(),
        config.auth.audience.clone(),
    )
}

/// Probe for configuration files
///
/// Searches `odm-auth.{toml,json}` in the working directory, then in
/// `~/.config/odm-auth/`.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("odm-auth.toml"));
        candidates.push(cwd.join("odm-auth.json"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".config").join("odm-auth");
        candidates.push(dir.join("config.toml"));
        candidates.push(dir.join("config.json"));
    }

    candidates.into_iter().find(|path| path.exists())
}

const NO_CONFIG_FILE: &str = "No config file found in any of the standard locations";

fn path_was_probed(err: &OdmAuthError) -> bool {
    matches!(err, OdmAuthError::Config(message) if message == NO_CONFIG_FILE)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| OdmAuthError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| OdmAuthError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(OdmAuthError::Config(format!("Unsupported config format: {extension}"))),
    }
}

fn required<G>(get: &G, key: &str) -> Result<String>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).ok_or_else(|| {
        OdmAuthError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn parsed<G, T>(get: &G, key: &str, default: T) -> Result<T>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| OdmAuthError::Config(format!("Invalid value for {key} ({raw}): {e}"))),
        None => Ok(default),
    }
}
