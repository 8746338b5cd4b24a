//! PCA reducer artifact

use crate::error::{DataShapeError, PredictionError, Stage};
use crate::models::artifact::{ArtifactKind, ArtifactPayload};
use crate::models::inference::DimensionReduction;
use serde::{Deserialize, Serialize};

/// Linear projection onto fitted principal components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcaReducer {
    /// Per-feature mean subtracted before projecting
    mean: Vec<f64>,
    /// One row per component, each of length `mean.len()`
    components: Vec<Vec<f64>>,
    /// Informational, not used for inference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explained_variance_ratio: Option<Vec<f64>>,
}

impl PcaReducer {
    pub fn new(mean: Vec<f64>, components: Vec<Vec<f64>>) -> Self {
        Self {
            mean,
            components,
            explained_variance_ratio: None,
        }
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn explained_variance_ratio(&self) -> Option<&[f64]> {
        self.explained_variance_ratio.as_deref()
    }
}

impl ArtifactPayload for PcaReducer {
    const KIND: ArtifactKind = ArtifactKind::PcaReducer;

    fn validate(&self) -> Result<(), String> {
        let n_features = self.mean.len();
        if n_features == 0 {
            return Err("mean is empty".to_string());
        }
        if self.components.is_empty() {
            return Err("no components".to_string());
        }
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err("mean contains a non-finite value".to_string());
        }
        for (i, row) in self.components.iter().enumerate() {
            if row.len() != n_features {
                return Err(format!(
                    "component {i} has {} weights, expected {n_features}",
                    row.len()
                ));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(format!("component {i} contains a non-finite weight"));
            }
        }
        if let Some(ratio) = &self.explained_variance_ratio {
            if ratio.len() != self.components.len() {
                return Err("explained_variance_ratio length differs from components".to_string());
            }
        }
        Ok(())
    }
}

impl DimensionReduction for PcaReducer {
    fn input_width(&self) -> usize {
        self.mean.len()
    }

    fn output_width(&self) -> usize {
        self.components.len()
    }

    fn reduce(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if features.len() != self.mean.len() {
            return Err(DataShapeError::WidthMismatch {
                stage: Stage::Reducer,
                expected: self.mean.len(),
                actual: features.len(),
            }
            .into());
        }

        // X_pca = (X - mean) @ components^T
        let projected: Vec<f64> = self
            .components
            .iter()
            .map(|component| {
                features
                    .iter()
                    .zip(&self.mean)
                    .zip(component)
                    .map(|((x, m), w)| (x - m) * w)
                    .sum::<f64>()
            })
            .collect();

        Ok(projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reducer() -> PcaReducer {
        PcaReducer::new(
            vec![1.0, 2.0, 3.0],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.5, 0.5]],
        )
    }

    #[test]
    fn test_projection() {
        let reduced = reducer().reduce(&[3.0, 4.0, 7.0]).unwrap();
        // (3-1)*1 = 2 ; (4-2)*0.5 + (7-3)*0.5 = 3
        assert_eq!(reduced, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_maps_to_origin() {
        let reduced = reducer().reduce(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(reduced, vec![0.0, 0.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let err = reducer().reduce(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            PredictionError::DataShape(DataShapeError::WidthMismatch {
                stage: Stage::Reducer,
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_explained_variance_from_artifact() {
        let json = r#"{
            "mean": [0.0, 0.0],
            "components": [[1.0, 0.0]],
            "explained_variance_ratio": [0.75]
        }"#;
        let reducer: PcaReducer = serde_json::from_str(json).unwrap();
        assert_eq!(reducer.explained_variance_ratio(), Some(&[0.75][..]));
        assert_eq!(reducer.validate(), Ok(()));
        assert_eq!(PcaReducer::new(vec![0.0], vec![vec![1.0]]).explained_variance_ratio(), None);
    }

    #[test]
    fn test_validate_ragged_components() {
        let bad = PcaReducer::new(vec![0.0, 0.0], vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(bad.validate().unwrap_err().contains("component 1"));
        assert!(PcaReducer::new(vec![], vec![]).validate().is_err());
        assert!(reducer().validate().is_ok());
    }
}
