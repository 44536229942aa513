//! # Pickup Server
//!
//! Entry point for the marketplace API gateway.
//!
//! Initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - CSRF token store and rate limiter table
//! - HTTP server with the security pipeline

use anyhow::Result;
use axum::Router;
use tracing::info;

use pickup_server::config::Settings;
use pickup_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    pickup_server::telemetry::init_tracing();

    info!("Starting Pickup Server...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Business routes live with their handlers; without them the pipeline
    // still serves health, metrics and CSRF issuance.
    let application = Application::build(settings, Router::new()).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
