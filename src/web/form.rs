//! Raw form fields as submitted by the browser

use crate::types::transaction::{TransactionRecord, TransactionType};
use serde::Deserialize;

/// Form body with every field kept as text so a bad value can be reported
/// without losing the rest of the input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    pub step: String,
    pub amount: String,
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_org: String,
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: String,
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: String,
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
}

fn parse_amount(field: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("{field} must be a number (got '{raw}')"))
}

fn parse_type(raw: &str) -> Result<TransactionType, String> {
    TransactionType::ALL
        .into_iter()
        .find(|kind| kind.as_str() == raw.trim())
        .ok_or_else(|| format!("unknown transaction type '{raw}'"))
}

impl TransactionForm {
    /// Parse every field, failing on the first bad one
    pub fn parse(&self) -> Result<TransactionRecord, String> {
        Ok(TransactionRecord {
            step: self
                .step
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("step must be a whole number (got '{}')", self.step))?,
            amount: parse_amount("amount", &self.amount)?,
            old_balance_org: parse_amount("oldbalanceOrg", &self.old_balance_org)?,
            new_balance_orig: parse_amount("newbalanceOrig", &self.new_balance_orig)?,
            old_balance_dest: parse_amount("oldbalanceDest", &self.old_balance_dest)?,
            new_balance_dest: parse_amount("newbalanceDest", &self.new_balance_dest)?,
            transaction_type: parse_type(&self.transaction_type)?,
        })
    }

    /// Best-effort record for re-rendering the form: fields that parse keep
    /// the submitted value, the rest fall back to the defaults
    pub fn echo(&self) -> TransactionRecord {
        let fallback = TransactionRecord::default();
        let amount = |field: &str, raw: &str, default: f64| parse_amount(field, raw).unwrap_or(default);

        TransactionRecord {
            step: self.step.trim().parse().unwrap_or(fallback.step),
            amount: amount("amount", &self.amount, fallback.amount),
            old_balance_org: amount("oldbalanceOrg", &self.old_balance_org, fallback.old_balance_org),
            new_balance_orig: amount(
                "newbalanceOrig",
                &self.new_balance_orig,
                fallback.new_balance_orig,
            ),
            old_balance_dest: amount(
                "oldbalanceDest",
                &self.old_balance_dest,
                fallback.old_balance_dest,
            ),
            new_balance_dest: amount(
                "newbalanceDest",
                &self.new_balance_dest,
                fallback.new_balance_dest,
            ),
            transaction_type: parse_type(&self.transaction_type)
                .unwrap_or(fallback.transaction_type),
        }
    }
}
