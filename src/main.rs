//! FraudShield scoring service - main entry point
//!
//! Loads the trained classifier and column schema once, then serves scoring
//! requests over HTTP. Refuses to start if the artifacts cannot be loaded.

use anyhow::{Context, Result};
use fraudshield::{
    config::AppConfig,
    logging,
    metrics::MetricsReporter,
    models::{ArtifactStore, InferenceEngine},
    server::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    logging::init(&config.logging, "fraudshield")?;

    info!("Starting FraudShield scoring service");
    info!(
        "Detection threshold: {:.2}, risk levels: medium>={:.2}, high>={:.2}",
        config.detection.threshold,
        config.detection.risk_levels.medium,
        config.detection.risk_levels.high
    );

    // Artifacts are required; a failure here stops the process
    let engine = InferenceEngine::from_config(&config)?;
    let importance = ArtifactStore::new(&config.artifacts).load_importance();

    let state = AppState::new(engine, importance);

    if config.server.stats_interval_secs > 0 {
        let reporter = MetricsReporter::new(state.metrics.clone(), config.server.stats_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Scoring service shutting down...");
    state.metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
