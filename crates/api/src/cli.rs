//! Command line interface.

use std::path::PathBuf;

use clap::Parser;
use odm_auth_domain::constants::{ENV_CONFIG_FILE, ENV_HUB_URL, ENV_LOG_JSON};
use odm_auth_domain::{Config, Result};
use odm_auth_infra::config;

/// OAuth2 + PKCE callback listener for notebook access to WebODM.
#[derive(Debug, Parser)]
#[command(name = "odm-auth-server", version, about)]
pub struct Cli {
    /// Local port to listen on (0 picks a free port).
    #[arg(long, short)]
    pub port: Option<u16>,

    /// External base URL of the notebook server.
    #[arg(long = "base-url", env = ENV_HUB_URL)]
    pub base_url: Option<String>,

    /// TOML or JSON config file, instead of environment variables.
    #[arg(long, env = ENV_CONFIG_FILE)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, env = ENV_LOG_JSON)]
    pub log_json: bool,
}

impl Cli {
    /// Load configuration and apply command line overrides.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Config` if loading or validation fails.
    pub fn load_config(&self) -> Result<Config> {
        let mut loaded = match &self.config {
            Some(path) => config::load_from_file(Some(path.clone()))?,
            None => config::load()?,
        };
        self.apply(&mut loaded);
        config::validate(&loaded)?;
        Ok(loaded)
    }

    /// Overwrite the loaded settings with any flags given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(base_url) = &self.base_url {
            config.listener.hub_url.clone_from(base_url);
        }
    }
}
