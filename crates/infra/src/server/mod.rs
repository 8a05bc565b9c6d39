//! Loopback HTTP listener that receives the OAuth redirect.
//!
//! Routes:
//! - `GET /` status page
//! - `GET /redirect` start a login (303 to the provider)
//! - `GET /callback` finish a login
//! - `GET /tokens` current tokens as JSON, 404 when a login is needed

pub mod error;
pub mod handlers;
pub mod pages;
pub mod status;

use std::net::{Ipv4Addr, SocketAddr};

use axum::routing::get;
use axum::Router;
use odm_auth_common::auth::OAuthService;
use odm_auth_domain::{ListenerSettings, OdmAuthError, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use error::CallbackError;
pub use status::TokenStatus;

use crate::inputs::InputStore;

/// Shared state injected into every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// OAuth flow the handlers drive.
    pub service: OAuthService,
    /// Listener addressing for URLs in responses.
    pub listener: ListenerSettings,
    /// Inputs record updated after a login.
    pub inputs: InputStore,
    /// Port the listener is bound to, recorded in the inputs record.
    pub port: u16,
}

/// Build the listener's router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::status))
        .route("/redirect", get(handlers::redirect))
        .route("/callback", get(handlers::callback))
        .route("/tokens", get(handlers::tokens))
        .with_state(state)
}

/// Running callback listener.
pub struct CallbackServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:{listener.port}` (0 picks a free port), record the
    /// port in the inputs record and start serving.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Network` if the port cannot be bound.
    pub async fn start(
        service: OAuthService,
        listener: ListenerSettings,
        inputs: InputStore,
    ) -> Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, listener.port));
        let tcp = TcpListener::bind(addr).await.map_err(|err| {
            OdmAuthError::Network(format!("failed to bind callback listener on {addr}: {err}"))
        })?;

        let port = tcp
            .local_addr()
            .map_err(|err| OdmAuthError::Network(format!("failed to determine port: {err}")))?
            .port();

        if let Err(err) = inputs.write_port(port).await {
            warn!(port, error = %err, "failed to record listener port");
        }

        let app = router(AppState { service, listener, inputs, port });
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(tcp, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("callback listener error: {}", err);
            }
        });

        info!(port, "callback listener started");
        Ok(Self { port, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    /// Bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL on the loopback interface.
    #[must_use]
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Shut down the listener gracefully.
    ///
    /// # Errors
    /// Returns `OdmAuthError::Internal` if the serving task panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    return Err(OdmAuthError::Internal(format!(
                        "callback listener panicked: {err}"
                    )));
                }
            }
        }

        info!(port = self.port, "callback listener stopped");
        Ok(())
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for CallbackServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackServer").field("port", &self.port).finish_non_exhaustive()
    }
}
