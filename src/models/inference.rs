//! Three-stage inference engine for fraud detection

use crate::error::{ArtifactLoadError, PredictionError, Stage};
use crate::feature_extractor::{FeatureExtractor, FeatureRow};
use crate::types::transaction::TransactionRecord;
use tracing::debug;

/// Stage 1: keep the columns the downstream model was trained on
pub trait FeatureSelection: Send + Sync {
    /// Columns the selector was fit on
    fn input_features(&self) -> &[String];

    /// Number of values `select` produces
    fn output_width(&self) -> usize;

    fn select(&self, row: &FeatureRow) -> Result<Vec<f64>, PredictionError>;
}

/// Stage 2: project selected features into a lower-dimensional space
pub trait DimensionReduction: Send + Sync {
    fn input_width(&self) -> usize;

    fn output_width(&self) -> usize;

    fn reduce(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;
}

/// Stage 3: probability of the fraud class
pub trait ProbabilisticClassifier: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    fn input_width(&self) -> usize;

    /// Fraud probability in [0, 1]
    fn classify(&self, features: &[f64]) -> Result<f64, PredictionError>;
}

/// Selector → reducer → classifier, applied to one record at a time.
///
/// Immutable once built, so it can be shared across request handlers.
pub struct InferenceEngine {
    extractor: FeatureExtractor,
    selector: Box<dyn FeatureSelection>,
    reducer: Box<dyn DimensionReduction>,
    classifier: Box<dyn ProbabilisticClassifier>,
}

impl InferenceEngine {
    /// Assemble an engine from already loaded stages without checking that
    /// their widths line up. Mismatches surface as shape errors on predict.
    pub fn from_stages(
        selector: Box<dyn FeatureSelection>,
        reducer: Box<dyn DimensionReduction>,
        classifier: Box<dyn ProbabilisticClassifier>,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            selector,
            reducer,
            classifier,
        }
    }

    /// Assemble an engine and verify the stage chain
    pub fn new(
        selector: Box<dyn FeatureSelection>,
        reducer: Box<dyn DimensionReduction>,
        classifier: Box<dyn ProbabilisticClassifier>,
    ) -> Result<Self, ArtifactLoadError> {
        let engine = Self::from_stages(selector, reducer, classifier);
        engine.check_chain()?;
        Ok(engine)
    }

    /// Verify each stage produces what the next one expects
    pub fn check_chain(&self) -> Result<(), ArtifactLoadError> {
        if self.selector.output_width() != self.reducer.input_width() {
            return Err(ArtifactLoadError::ChainMismatch {
                upstream: Stage::Selector,
                downstream: Stage::Reducer,
                produced: self.selector.output_width(),
                expected: self.reducer.input_width(),
            });
        }
        if self.reducer.output_width() != self.classifier.input_width() {
            return Err(ArtifactLoadError::ChainMismatch {
                upstream: Stage::Reducer,
                downstream: Stage::Classifier,
                produced: self.reducer.output_width(),
                expected: self.classifier.input_width(),
            });
        }
        Ok(())
    }

    /// Name of the classifier backend
    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Number of features after selection
    pub fn selected_count(&self) -> usize {
        self.selector.output_width()
    }

    /// Number of components after reduction
    pub fn component_count(&self) -> usize {
        self.reducer.output_width()
    }

    /// Fraud probability for one record.
    ///
    /// Pure: the same record always yields the same probability.
    pub fn predict(&self, record: &TransactionRecord) -> Result<f64, PredictionError> {
        let row = self.extractor.extract(record);
        self.predict_row(&row)
    }

    /// Fraud probability for an already extracted feature row
    pub fn predict_row(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
        let selected = self.selector.select(row)?;
        let reduced = self.reducer.reduce(&selected)?;
        let probability = self.classifier.classify(&reduced)?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::Runtime(format!(
                "{} returned probability {probability} outside [0, 1]",
                self.classifier.name()
            )));
        }

        debug!(
            classifier = %self.classifier.name(),
            selected = ?selected,
            reduced = ?reduced,
            probability = probability,
            "Inference complete"
        );

        Ok(probability)
    }
}
