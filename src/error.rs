//! Error types for artifact loading and prediction

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage that raised a shape error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Selector,
    Reducer,
    Classifier,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Selector => "feature selector",
            Stage::Reducer => "reducer",
            Stage::Classifier => "classifier",
        };
        f.write_str(name)
    }
}

/// Failure to load a pretrained artifact at startup.
///
/// Always fatal: the process cannot serve predictions without all three stages.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "artifact {} has format version {found}, this build supports up to {supported}",
        path.display()
    )]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("artifact {} is a {found}, expected a {expected}", path.display())]
    WrongKind {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("artifact {} is invalid: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("{upstream} produces {produced} features but {downstream} expects {expected}")]
    ChainMismatch {
        upstream: Stage,
        downstream: Stage,
        produced: usize,
        expected: usize,
    },

    #[cfg(feature = "onnx")]
    #[error("failed to load ONNX model {}: {reason}", path.display())]
    Onnx { path: PathBuf, reason: String },
}

/// Input handed to a stage does not match the schema it was fit on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataShapeError {
    #[error("{stage}: expected {expected} features, got {actual}")]
    WidthMismatch {
        stage: Stage,
        expected: usize,
        actual: usize,
    },

    #[error("{stage}: input is missing column '{column}'")]
    MissingColumn { stage: Stage, column: String },

    #[error("{stage}: feature {index} is not a finite number")]
    NonFinite { stage: Stage, index: usize },
}

/// A transaction record that violates the form's bounds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("step must be at most {max} (got {value})")]
    StepOutOfRange { value: u32, max: u32 },
}

/// Failure of a single prediction request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("invalid transaction: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("data shape error: {0}")]
    DataShape(#[from] DataShapeError),

    #[error("inference backend failed: {0}")]
    Runtime(String),
}
