//! HTTP front end: the prediction form and a small JSON API

pub mod form;
pub mod handlers;
pub mod render;

use crate::error::PredictionError;
use crate::metrics::PredictionMetrics;
use crate::models::inference::InferenceEngine;
use crate::session::FormSession;
use crate::types::risk::{PredictionOutcome, RiskThresholds};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub thresholds: RiskThresholds,
    pub metrics: Arc<PredictionMetrics>,
}

impl AppState {
    pub fn new(engine: Arc<InferenceEngine>, thresholds: RiskThresholds) -> Self {
        Self {
            engine,
            thresholds,
            metrics: Arc::new(PredictionMetrics::new()),
        }
    }

    /// Run one prediction for a request's form session and record metrics
    pub fn predict(&self, session: &mut FormSession) -> Result<PredictionOutcome, PredictionError> {
        let start = Instant::now();

        match session.predict(&self.engine, &self.thresholds) {
            Ok(outcome) => {
                let latency = start.elapsed();
                debug!(
                    prediction_id = %outcome.prediction_id,
                    latency_us = latency.as_micros() as u64,
                    "Prediction served"
                );
                self.metrics.record_prediction(
                    latency,
                    outcome.probability,
                    outcome.label,
                    outcome.overridden,
                );
                Ok(outcome)
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!(error = %e, "Prediction failed");
                Err(e)
            }
        }
    }
}

/// Build the axum router for the form and API
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/sample/{kind}", post(handlers::sample_form))
        .route("/api/predict", post(handlers::api_predict))
        .route("/api/samples/{kind}", get(handlers::api_sample))
        .route("/api/metrics", get(handlers::api_metrics))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
