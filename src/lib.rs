//! E-wallet transaction fraud detector
//!
//! Scores a single transaction with a pretrained pipeline (feature
//! selector, PCA reducer, classifier) and maps the fraud probability to a
//! safe / warning / fraud label. Served as an HTML form plus a JSON API.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod session;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{ArtifactLoadError, DataShapeError, PredictionError, RecordError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use models::loader::ModelLoader;
pub use session::{FormSession, SampleKind};
pub use types::{PredictionOutcome, RiskLabel, RiskThresholds, TransactionRecord, TransactionType};
