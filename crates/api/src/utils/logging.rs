//! Tracing setup and structured startup logging.

use odm_auth_domain::{Config, OdmAuthError};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,odm_auth_common=debug,odm_auth_infra=debug";

/// Install the global subscriber: `RUST_LOG` filtering, human readable or
/// JSON lines on stderr.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)).try_init()?;
    }
    Ok(())
}

/// Log where the listener is reachable. Never logs credentials.
#[inline]
pub fn log_listener_ready(config: &Config, port: u16) {
    info!(
        port,
        redirect_uri = %config.listener.redirect_uri(),
        login_url = %config.listener.login_url(),
        inputs_record = ?config.input_file,
        "listener_ready"
    );
}

/// Log a startup failure with a stable label.
#[inline]
pub fn log_startup_failure(error: &OdmAuthError) {
    warn!(kind = error.label(), error = %error, "startup_failure");
}
