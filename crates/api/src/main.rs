//! odm-auth-server - OAuth callback listener for notebook sessions
//!
//! Main entry point.

use clap::Parser;
use odm_auth_api::utils::logging::{init_tracing, log_startup_failure};
use odm_auth_api::{AppContext, Cli};
use odm_auth_infra::config::load_dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing, so .env can supply flag defaults.
    load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let config = cli.load_config().inspect_err(log_startup_failure)?;
    let ctx = AppContext::new(config).inspect_err(log_startup_failure)?;
    let server = ctx.start_listener().await.inspect_err(log_startup_failure)?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown().await?;
    Ok(())
}
