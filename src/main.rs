// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::ChartService;
use crate::application::meter_service::MeterService;
use crate::infrastructure::config::load_charts_config;
use crate::infrastructure::measurement_client::MeasurementClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_charts_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(MeasurementClient::new(
        config.measurements.base_url,
        config.measurements.method,
        Duration::from_secs(config.measurements.timeout_secs),
    )?);

    // Create services (application layer)
    let meter_service = MeterService::new(repository.clone());
    let chart_service = ChartService::new(repository, config.chart, config.prices, config.labels);

    let state = Arc::new(AppState {
        meter_service,
        chart_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    let addr = config.server.bind;
    tracing::info!("Starting meter-charts service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
