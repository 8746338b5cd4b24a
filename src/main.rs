//! E-wallet fraud detector - main entry point
//!
//! Loads the pretrained artifacts and serves the prediction form.

use anyhow::{Context, Result};
use ewallet_fraud_detector::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::MetricsReporter,
    models::loader::ModelLoader,
    web::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .with_context(|| format!("Invalid log level '{}'", logging.level))?,
    };

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;
    init_tracing(&config.logging)?;

    info!("Starting e-wallet fraud detector");
    info!(
        "Label thresholds: warning>={:.2}, fraud>{:.2}",
        config.detection.warning_threshold, config.detection.fraud_threshold
    );

    let engine = ModelLoader::load_from_config(&config.models)
        .context("Failed to load pretrained artifacts")?;
    info!(
        classifier = %engine.classifier_name(),
        selected = engine.selected_count(),
        components = engine.component_count(),
        "Inference engine ready"
    );

    let state = AppState::new(Arc::new(engine), config.detection.thresholds());
    let metrics = state.metrics.clone();

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Detector shutting down...");
    metrics.print_summary();

    Ok(())
}
