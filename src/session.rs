//! Request-scoped form state.
//!
//! A [`FormSession`] holds what the user currently sees in the form plus an
//! optional label override left behind by a sample generator. It is created
//! per request and passed explicitly into the prediction call.

use crate::error::PredictionError;
use crate::models::inference::InferenceEngine;
use crate::types::risk::{PredictionOutcome, RiskLabel, RiskThresholds};
use crate::types::transaction::{TransactionRecord, TransactionType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Canned example transactions offered next to the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Safe,
    Warning,
    Fraud,
}

impl SampleKind {
    pub const ALL: [SampleKind; 3] = [SampleKind::Safe, SampleKind::Warning, SampleKind::Fraud];

    /// Example record for this kind
    pub fn record(&self) -> TransactionRecord {
        match self {
            SampleKind::Safe => TransactionRecord {
                step: 1,
                amount: 500.0,
                old_balance_org: 6000.0,
                new_balance_orig: 5500.0,
                old_balance_dest: 0.0,
                new_balance_dest: 500.0,
                transaction_type: TransactionType::Payment,
            },
            SampleKind::Warning => TransactionRecord {
                step: 2,
                amount: 3000.0,
                old_balance_org: 5000.0,
                new_balance_orig: 2000.0,
                old_balance_dest: 0.0,
                new_balance_dest: 3000.0,
                transaction_type: TransactionType::CashOut,
            },
            SampleKind::Fraud => TransactionRecord {
                step: 1,
                amount: 50000.0,
                old_balance_org: 50000.0,
                new_balance_orig: 0.0,
                old_balance_dest: 0.0,
                new_balance_dest: 50000.0,
                transaction_type: TransactionType::Transfer,
            },
        }
    }

    /// Label forced on the prediction that follows loading this sample.
    /// The safe sample relies on the model.
    pub fn label_override(&self) -> Option<RiskLabel> {
        match self {
            SampleKind::Safe => None,
            SampleKind::Warning => Some(RiskLabel::Warning),
            SampleKind::Fraud => Some(RiskLabel::Fraud),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Safe => "safe",
            SampleKind::Warning => "warning",
            SampleKind::Fraud => "fraud",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(SampleKind::Safe),
            "warning" => Ok(SampleKind::Warning),
            "fraud" => Ok(SampleKind::Fraud),
            other => Err(format!("unknown sample '{other}'")),
        }
    }
}

/// Current form values and any pending label override
#[derive(Debug, Clone, Default)]
pub struct FormSession {
    record: TransactionRecord,
    label_override: Option<RiskLabel>,
}

impl FormSession {
    /// Session holding user-entered values, no override
    pub fn with_record(record: TransactionRecord) -> Self {
        Self {
            record,
            label_override: None,
        }
    }

    pub fn record(&self) -> &TransactionRecord {
        &self.record
    }

    /// Replace the form values (a manual edit)
    pub fn set_record(&mut self, record: TransactionRecord) {
        self.record = record;
    }

    pub fn pending_override(&self) -> Option<RiskLabel> {
        self.label_override
    }

    /// Fill the form with a sample and arm its override
    pub fn load_sample(&mut self, kind: SampleKind) {
        self.record = kind.record();
        self.label_override = kind.label_override();
        debug!(sample = %kind, label_override = ?self.label_override, "Sample loaded");
    }

    /// Score the current record.
    ///
    /// A pending override decides the label instead of the thresholds and
    /// is consumed by the first prediction that completes. A failed
    /// prediction leaves it pending.
    pub fn predict(
        &mut self,
        engine: &InferenceEngine,
        thresholds: &RiskThresholds,
    ) -> Result<PredictionOutcome, PredictionError> {
        self.record.validate()?;
        let probability = engine.predict(&self.record)?;

        let (label, overridden) = match self.label_override.take() {
            Some(label) => (label, true),
            None => (RiskLabel::from_probability(probability, thresholds), false),
        };

        let outcome = PredictionOutcome::new(probability, label, overridden);

        info!(
            prediction_id = %outcome.prediction_id,
            probability = probability,
            label = %label,
            overridden = overridden,
            transaction_type = %self.record.transaction_type,
            "Transaction scored"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DataShapeError, RecordError, Stage};
    use crate::models::classifier::{RandomForestClassifier, TreeNode};
    use crate::models::reducer::PcaReducer;
    use crate::models::selector::FeatureSelector;

    /// Engine that always answers `fraud / (legit + fraud)`
    fn constant_engine(legit: f64, fraud: f64) -> InferenceEngine {
        let selector = FeatureSelector::new(
            crate::feature_extractor::FeatureExtractor::new().feature_names(),
            vec!["amount".to_string()],
        );
        let reducer = PcaReducer::new(vec![0.0], vec![vec![1.0]]);
        let forest = RandomForestClassifier::new(
            1,
            vec!["legit".to_string(), "fraud".to_string()],
            vec![TreeNode::Leaf {
                value: vec![legit, fraud],
            }],
        );
        InferenceEngine::new(Box::new(selector), Box::new(reducer), Box::new(forest)).unwrap()
    }

    #[test]
    fn test_fraud_override_applies_once() {
        let engine = constant_engine(9.0, 1.0);
        let thresholds = RiskThresholds::default();
        let mut session = FormSession::default();

        session.load_sample(SampleKind::Fraud);
        assert_eq!(session.record(), &SampleKind::Fraud.record());

        let first = session.predict(&engine, &thresholds).unwrap();
        assert_eq!(first.label, RiskLabel::Fraud);
        assert!(first.overridden);
        assert!((first.probability - 0.1).abs() < 1e-12);

        let second = session.predict(&engine, &thresholds).unwrap();
        assert_eq!(second.label, RiskLabel::Safe);
        assert!(!second.overridden);
    }

    #[test]
    fn test_warning_override() {
        let engine = constant_engine(1.0, 9.0);
        let mut session = FormSession::default();

        session.load_sample(SampleKind::Warning);
        let outcome = session.predict(&engine, &RiskThresholds::default()).unwrap();
        assert_eq!(outcome.label, RiskLabel::Warning);
        assert_eq!(session.pending_override(), None);
    }

    #[test]
    fn test_safe_sample_uses_thresholds() {
        let engine = constant_engine(1.0, 9.0);
        let mut session = FormSession::default();

        session.load_sample(SampleKind::Safe);
        assert_eq!(session.pending_override(), None);

        let outcome = session.predict(&engine, &RiskThresholds::default()).unwrap();
        assert_eq!(outcome.label, RiskLabel::Fraud);
        assert!(!outcome.overridden);
    }

    #[test]
    fn test_safe_sample_clears_earlier_override() {
        let mut session = FormSession::default();
        session.load_sample(SampleKind::Fraud);
        session.load_sample(SampleKind::Safe);
        assert_eq!(session.pending_override(), None);
    }

    #[test]
    fn test_failed_prediction_keeps_override() {
        let engine = constant_engine(9.0, 1.0);
        let mut session = FormSession::default();
        session.load_sample(SampleKind::Fraud);

        let mut bad = SampleKind::Fraud.record();
        bad.amount = -5.0;
        session.set_record(bad);

        let err = session.predict(&engine, &RiskThresholds::default()).unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InvalidRecord(RecordError::Negative { field: "amount", .. })
        ));
        assert_eq!(session.pending_override(), Some(RiskLabel::Fraud));
    }

    #[test]
    fn test_shape_error_surfaces() {
        let selector = FeatureSelector::new(vec!["unknown".to_string()], vec!["unknown".to_string()]);
        let reducer = PcaReducer::new(vec![0.0], vec![vec![1.0]]);
        let forest = RandomForestClassifier::new(
            1,
            vec!["legit".to_string(), "fraud".to_string()],
            vec![TreeNode::Leaf {
                value: vec![1.0, 1.0],
            }],
        );
        let engine =
            InferenceEngine::new(Box::new(selector), Box::new(reducer), Box::new(forest)).unwrap();

        let mut session = FormSession::default();
        let err = session.predict(&engine, &RiskThresholds::default()).unwrap_err();
        assert_eq!(
            err,
            PredictionError::DataShape(DataShapeError::MissingColumn {
                stage: Stage::Selector,
                column: "unknown".to_string(),
            })
        );
    }

    #[test]
    fn test_sample_kind_parsing() {
        for kind in SampleKind::ALL {
            assert_eq!(kind.as_str().parse::<SampleKind>(), Ok(kind));
            assert!(kind.record().validate().is_ok());
        }
        assert!("risky".parse::<SampleKind>().is_err());
    }
}
