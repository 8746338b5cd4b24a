//! Feature extraction for fraud model inference.
//!
//! Expands a transaction record into the named columns the artifacts were
//! fit on, with the transaction type one-hot encoded.

use crate::error::{DataShapeError, Stage};
use crate::types::transaction::{TransactionRecord, TransactionType};

/// Column names in the order they are produced
pub const FEATURE_NAMES: [&str; 11] = [
    "step",
    "amount",
    "oldbalanceOrg",
    "newbalanceOrig",
    "oldbalanceDest",
    "newbalanceDest",
    "type_CASH_OUT",
    "type_PAYMENT",
    "type_CASH_IN",
    "type_TRANSFER",
    "type_DEBIT",
];

/// One row of named features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    /// Build a row from parallel name and value lists.
    ///
    /// The lists must have the same length; the row is the selector's input,
    /// so a ragged row is reported against that stage.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self, DataShapeError> {
        if names.len() != values.len() {
            return Err(DataShapeError::WidthMismatch {
                stage: Stage::Selector,
                expected: names.len(),
                actual: values.len(),
            });
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| self.values.get(idx).copied())
    }
}

/// Transforms records into model input rows.
///
/// Matches the preprocessing done before the artifacts were fit.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature row for a record.
    pub fn extract(&self, record: &TransactionRecord) -> FeatureRow {
        let mut values = Vec::with_capacity(FEATURE_NAMES.len());

        // Numeric fields (6)
        values.push(record.step as f64);
        values.push(record.amount);
        values.push(record.old_balance_org);
        values.push(record.new_balance_orig);
        values.push(record.old_balance_dest);
        values.push(record.new_balance_dest);

        // Type indicators (5)
        values.extend(record.transaction_type.indicators());

        FeatureRow {
            names: self.feature_names(),
            values,
        }
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }

    /// Get feature names (matching the training column order).
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    /// Indicator column name for a transaction type
    pub fn indicator_name(kind: TransactionType) -> String {
        format!("type_{}", kind.as_str())
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
