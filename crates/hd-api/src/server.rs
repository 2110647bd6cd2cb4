//! Portal server implementation.

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{time, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::{error, info};

use crate::middleware::{request_id, request_logging, security_headers};
use crate::routes;
use crate::sessions::{purge_expired_sessions, PortalSessionStore, DEFAULT_CLEANUP_INTERVAL};
use crate::state::AppState;

/// Portal server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Name of the session cookie.
    pub session_cookie_name: String,
    /// Sessions expire after this much inactivity.
    pub session_expiry: Duration,
    /// Only send the session cookie over HTTPS.
    pub session_secure: bool,
    /// Interval between purges of expired sessions.
    pub session_cleanup_interval: Duration,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(30),
            session_cookie_name: "helpdesk_session".to_string(),
            session_expiry: Duration::from_secs(8 * 60 * 60),
            session_secure: true,
            session_cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Portal server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    sessions: PortalSessionStore,
}

impl ApiServer {
    /// Creates a new server.
    pub fn new(state: AppState, sessions: PortalSessionStore, config: ApiServerConfig) -> Self {
        Self {
            config,
            state,
            sessions,
        }
    }

    /// Creates a new server with default configuration.
    pub fn with_state(state: AppState, sessions: PortalSessionStore) -> Self {
        Self::new(state, sessions, ApiServerConfig::default())
    }

    /// Builds the router with sessions and middleware applied.
    pub fn router(&self) -> Router {
        routes::health::init_start_time();

        let inactivity = time::Duration::try_from(self.config.session_expiry)
            .unwrap_or(time::Duration::hours(8));
        let sessions = SessionManagerLayer::new(self.sessions.clone())
            .with_name(self.config.session_cookie_name.clone())
            .with_secure(self.config.session_secure)
            .with_http_only(true)
            .with_same_site(SameSite::Lax)
            .with_expiry(Expiry::OnInactivity(inactivity));

        // Layers wrap outward: the last one added runs first.
        routes::create_router(self.state.clone())
            .layer(sessions)
            .layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(request_logging))
            .layer(middleware::from_fn(request_id))
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::new())
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), std::io::Error> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs the server with a custom shutdown signal.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = self.config.bind_address;

        info!("Starting portal on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        let purge = tokio::spawn(purge_expired_sessions(
            self.sessions.clone(),
            self.config.session_cleanup_interval,
        ));

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        purge.abort();
        served?;

        info!("Portal shut down gracefully");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
