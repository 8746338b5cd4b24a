//! ONNX Runtime classifier backend

use crate::error::{ArtifactLoadError, DataShapeError, PredictionError, Stage};
use crate::models::inference::ProbabilisticClassifier;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier exported to ONNX with a tensor probability output
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    n_features: usize,
}

impl OnnxClassifier {
    /// Load an ONNX model expecting `n_features` inputs
    pub fn load(path: &Path, n_features: usize, threads: usize) -> Result<Self, ArtifactLoadError> {
        if !path.exists() {
            return Err(ArtifactLoadError::Missing {
                path: path.to_path_buf(),
            });
        }

        info!(path = %path.display(), threads = threads, "Loading ONNX classifier");

        let session = Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_error(path, e))?
            .with_intra_threads(threads)
            .map_err(|e| load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx names the probability output "probabilities"; prefer it
        // over the label output.
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "ONNX classifier loaded"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            n_features,
        })
    }
}

fn load_error(path: &Path, e: impl fmt::Display) -> ArtifactLoadError {
    ArtifactLoadError::Onnx {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn runtime_error(e: impl fmt::Display) -> PredictionError {
    PredictionError::Runtime(e.to_string())
}

/// Fraud probability from a `[batch, n_classes]`, `[n_classes]` or `[batch, 1]` tensor
fn fraud_prob_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let num_classes = match dims {
        [_, classes] => *classes,
        [classes] => *classes,
        _ => return data.last().map(|&v| v as f64),
    };

    if num_classes >= 2 {
        data.get(1).map(|&v| v as f64)
    } else {
        data.first().map(|&v| v as f64)
    }
}

impl ProbabilisticClassifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_width(&self) -> usize {
        self.n_features
    }

    fn classify(&self, features: &[f64]) -> Result<f64, PredictionError> {
        if features.len() != self.n_features {
            return Err(DataShapeError::WidthMismatch {
                stage: Stage::Classifier,
                expected: self.n_features,
                actual: features.len(),
            }
            .into());
        }

        // Input tensor of shape [1, n_features]
        let shape = vec![1_i64, features.len() as i64];
        let values: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input_tensor = Tensor::from_array((shape, values)).map_err(runtime_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictionError::Runtime(format!("Lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(runtime_error)?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PredictionError::Runtime(format!("model has no output '{}'", self.output_name))
        })?;

        let (shape, data) = output.try_extract_tensor::<f32>().map_err(runtime_error)?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let probability = fraud_prob_from_tensor(&dims, data)
            .filter(|p| p.is_finite())
            .ok_or_else(|| PredictionError::Runtime("empty probability tensor".to_string()))?;

        debug!(model = %self.name, prob = probability, "Extracted from tensor");

        Ok(probability.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraud_prob_from_tensor_shapes() {
        assert_eq!(fraud_prob_from_tensor(&[1, 2], &[0.25, 0.75]), Some(0.75));
        assert_eq!(fraud_prob_from_tensor(&[2], &[0.5, 0.5]), Some(0.5));
        assert_eq!(fraud_prob_from_tensor(&[1, 1], &[0.125]), Some(0.125));
        assert_eq!(fraud_prob_from_tensor(&[1, 2], &[]), None);
    }

    #[test]
    fn test_missing_model_file() {
        let result = OnnxClassifier::load(Path::new("/nonexistent/model.onnx"), 3, 1);
        assert!(matches!(result, Err(ArtifactLoadError::Missing { .. })));
    }
}
