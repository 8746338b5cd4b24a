//! Feature selector artifact

use crate::error::{DataShapeError, PredictionError, Stage};
use crate::feature_extractor::FeatureRow;
use crate::models::artifact::{ArtifactKind, ArtifactPayload};
use crate::models::inference::FeatureSelection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keeps a fixed, ordered subset of the columns it was fit on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSelector {
    /// Columns seen when the selector was fit, in order
    input_features: Vec<String>,
    /// Columns passed downstream, in output order
    selected: Vec<String>,
}

impl FeatureSelector {
    pub fn new(input_features: Vec<String>, selected: Vec<String>) -> Self {
        Self {
            input_features,
            selected,
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }
}

impl ArtifactPayload for FeatureSelector {
    const KIND: ArtifactKind = ArtifactKind::FeatureSelector;

    fn validate(&self) -> Result<(), String> {
        if self.selected.is_empty() {
            return Err("no features selected".to_string());
        }

        let known: HashSet<&str> = self.input_features.iter().map(String::as_str).collect();
        if known.len() != self.input_features.len() {
            return Err("duplicate name in input_features".to_string());
        }

        let mut seen = HashSet::new();
        for name in &self.selected {
            if !known.contains(name.as_str()) {
                return Err(format!("selected feature '{name}' is not an input feature"));
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("feature '{name}' selected twice"));
            }
        }

        Ok(())
    }
}

impl FeatureSelection for FeatureSelector {
    fn input_features(&self) -> &[String] {
        &self.input_features
    }

    fn output_width(&self) -> usize {
        self.selected.len()
    }

    fn select(&self, row: &FeatureRow) -> Result<Vec<f64>, PredictionError> {
        // Every column the selector was fit on must be present, even the
        // ones it drops.
        for name in &self.input_features {
            if row.get(name).is_none() {
                return Err(DataShapeError::MissingColumn {
                    stage: Stage::Selector,
                    column: name.clone(),
                }
                .into());
            }
        }

        let mut out = Vec::with_capacity(self.selected.len());
        for (index, name) in self.selected.iter().enumerate() {
            let value = row.get(name).ok_or_else(|| DataShapeError::MissingColumn {
                stage: Stage::Selector,
                column: name.clone(),
            })?;
            if !value.is_finite() {
                return Err(DataShapeError::NonFinite {
                    stage: Stage::Selector,
                    index,
                }
                .into());
            }
            out.push(value);
        }

        Ok(out)
    }
}
