//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::application::services::RateLimiters;
use crate::config::Settings;
use crate::infrastructure::cache::{spawn_sweeper, CsrfTokenStore, SweeperHandle};
use crate::presentation::http::{handlers, routes};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub csrf: Arc<CsrfTokenStore>,
    pub limiters: Arc<RateLimiters>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Fresh, empty security state for `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            csrf: Arc::new(CsrfTokenStore::from_settings(&settings.csrf)),
            limiters: Arc::new(RateLimiters::from_settings(&settings.rate_limit)),
            settings: Arc::new(settings),
        }
    }

    /// Start the background sweeps for the token store and rate counters.
    pub fn spawn_sweepers(&self) -> Vec<SweeperHandle> {
        let period = Duration::from_secs(self.settings.csrf.sweep_interval_secs);
        vec![
            self.csrf.spawn_sweeper(period),
            spawn_sweeper(self.limiters.clone(), period),
        ]
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    sweepers: Vec<SweeperHandle>,
}

impl Application {
    /// Build the application from settings and the business routes.
    pub async fn build(settings: Settings, api: Router<AppState>) -> Result<Self> {
        handlers::health::init_server_start();

        let addr = settings.server.socket_addr()?;
        let state = AppState::new(settings);

        let sweepers = state.spawn_sweepers();
        tracing::info!(
            interval_secs = state.settings.csrf.sweep_interval_secs,
            "Maintenance sweepers started"
        );

        let router = routes::create_router(state, api);

        // Bind to address
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            router,
            sweepers,
        })
    }

    /// Run the server until Ctrl+C, then stop the sweepers.
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        for sweeper in self.sweepers {
            sweeper.shutdown().await;
        }
        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
