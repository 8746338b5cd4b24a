//! Risk labels and the thresholding policy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk label shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Safe,
    Warning,
    Fraud,
}

impl RiskLabel {
    /// Determine the label from a fraud probability and thresholds
    pub fn from_probability(probability: f64, thresholds: &RiskThresholds) -> Self {
        if probability < thresholds.warning {
            RiskLabel::Safe
        } else if probability <= thresholds.fraud {
            RiskLabel::Warning
        } else {
            RiskLabel::Fraud
        }
    }

    /// Text shown on the result card
    pub fn display_name(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "Safe",
            RiskLabel::Warning => "Warning",
            RiskLabel::Fraud => "Fraud",
        }
    }

    /// CSS class of the severity indicator
    pub fn css_class(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "safe",
            RiskLabel::Warning => "warning",
            RiskLabel::Fraud => "danger",
        }
    }

    /// Color of the severity indicator and probability bar
    pub fn color(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "#2E7D32",
            RiskLabel::Warning => "#F9A825",
            RiskLabel::Fraud => "#C62828",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "safe",
            RiskLabel::Warning => "warning",
            RiskLabel::Fraud => "fraud",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability cut points.
///
/// `p < warning` is safe, `warning <= p <= fraud` is a warning and anything
/// above `fraud` is fraud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub warning: f64,
    pub fraud: f64,
}

impl RiskThresholds {
    pub fn new(warning: f64, fraud: f64) -> Self {
        Self { warning, fraud }
    }

    /// Both cut points must lie in [0, 1] and be ordered
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.warning)
            && (0.0..=1.0).contains(&self.fraud)
            && self.warning <= self.fraud
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            warning: 0.5,
            fraud: 0.7,
        }
    }
}

/// Result of one prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutcome {
    /// Unique prediction identifier
    pub prediction_id: String,

    /// Fraud probability from the pipeline (0.0 - 1.0)
    pub probability: f64,

    /// Label shown to the user
    pub label: RiskLabel,

    /// Whether the label was forced by a sample rather than thresholded
    pub overridden: bool,

    /// Evaluation timestamp
    pub evaluated_at: DateTime<Utc>,
}

impl PredictionOutcome {
    pub fn new(probability: f64, label: RiskLabel, overridden: bool) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            probability,
            label,
            overridden,
            evaluated_at: Utc::now(),
        }
    }

    /// Width of the probability bar, truncated to a whole percent
    pub fn percent(&self) -> u8 {
        (self.probability.clamp(0.0, 1.0) * 100.0) as u8
    }

    /// Probability as a percentage with two decimals, e.g. `6.00%`
    pub fn formatted_probability(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_boundaries() {
        let thresholds = RiskThresholds::default();

        assert_eq!(RiskLabel::from_probability(0.49, &thresholds), RiskLabel::Safe);
        assert_eq!(RiskLabel::from_probability(0.50, &thresholds), RiskLabel::Warning);
        assert_eq!(RiskLabel::from_probability(0.70, &thresholds), RiskLabel::Warning);
        assert_eq!(RiskLabel::from_probability(0.71, &thresholds), RiskLabel::Fraud);
        assert_eq!(RiskLabel::from_probability(0.0, &thresholds), RiskLabel::Safe);
        assert_eq!(RiskLabel::from_probability(1.0, &thresholds), RiskLabel::Fraud);
    }

    #[test]
    fn test_label_is_monotonic() {
        let thresholds = RiskThresholds::default();
        let rank = |label: RiskLabel| match label {
            RiskLabel::Safe => 0,
            RiskLabel::Warning => 1,
            RiskLabel::Fraud => 2,
        };

        let mut previous = 0;
        for i in 0..=1000 {
            let p = i as f64 / 1000.0;
            let current = rank(RiskLabel::from_probability(p, &thresholds));
            assert!(current >= previous, "label dropped at p={p}");
            previous = current;
        }
    }

    #[test]
    fn test_threshold_validation() {
        assert!(RiskThresholds::default().is_valid());
        assert!(RiskThresholds::new(0.6, 0.6).is_valid());
        assert!(!RiskThresholds::new(0.8, 0.7).is_valid());
        assert!(!RiskThresholds::new(-0.1, 0.7).is_valid());
        assert!(!RiskThresholds::new(0.5, 1.2).is_valid());
    }

    #[test]
    fn test_outcome_presentation() {
        let outcome = PredictionOutcome::new(0.8, RiskLabel::Fraud, false);
        assert_eq!(outcome.percent(), 80);
        assert_eq!(outcome.formatted_probability(), "80.00%");
        assert_eq!(outcome.label.css_class(), "danger");

        let outcome = PredictionOutcome::new(0.0625, RiskLabel::Safe, false);
        assert_eq!(outcome.percent(), 6);
        assert_eq!(outcome.formatted_probability(), "6.25%");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = PredictionOutcome::new(0.65, RiskLabel::Warning, true);

        let json = serde_json::to_string(&outcome).unwrap();
        let deserialized: PredictionOutcome = serde_json::from_str(&json).unwrap();

        assert_eq!(outcome.prediction_id, deserialized.prediction_id);
        assert_eq!(deserialized.label, RiskLabel::Warning);
        assert!(deserialized.overridden);
        assert!(json.contains("\"label\":\"warning\""));
    }
}
