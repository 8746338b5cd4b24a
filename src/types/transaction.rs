//! E-wallet transaction record submitted through the form

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest step the form accepts
pub const MAX_STEP: u32 = 1000;

/// Kind of e-wallet transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CashOut,
    Payment,
    CashIn,
    Transfer,
    Debit,
}

impl TransactionType {
    /// All types, in the order of their indicator columns
    pub const ALL: [TransactionType; 5] = [
        TransactionType::CashOut,
        TransactionType::Payment,
        TransactionType::CashIn,
        TransactionType::Transfer,
        TransactionType::Debit,
    ];

    /// Name as used in the training data
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Payment => "PAYMENT",
            TransactionType::CashIn => "CASH_IN",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Debit => "DEBIT",
        }
    }

    /// One-hot indicator values, aligned with [`TransactionType::ALL`]
    pub fn indicators(&self) -> [f64; 5] {
        let mut out = [0.0; 5];
        for (slot, kind) in out.iter_mut().zip(Self::ALL) {
            if kind == *self {
                *slot = 1.0;
            }
        }
        out
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction to be scored.
///
/// Built fresh for every prediction and never stored. Wire names follow the
/// columns of the dataset the models were trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Sequence step of the transaction
    pub step: u32,

    /// Transferred amount
    pub amount: f64,

    /// Sender balance before the transaction
    #[serde(rename = "oldbalanceOrg", alias = "old_balance_org")]
    pub old_balance_org: f64,

    /// Sender balance after the transaction
    #[serde(rename = "newbalanceOrig", alias = "new_balance_orig")]
    pub new_balance_orig: f64,

    /// Receiver balance before the transaction
    #[serde(rename = "oldbalanceDest", alias = "old_balance_dest")]
    pub old_balance_dest: f64,

    /// Receiver balance after the transaction
    #[serde(rename = "newbalanceDest", alias = "new_balance_dest")]
    pub new_balance_dest: f64,

    /// Transaction type
    #[serde(rename = "type", alias = "transaction_type")]
    pub transaction_type: TransactionType,
}

impl TransactionRecord {
    /// Check the bounds the form enforces on its inputs
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.step > MAX_STEP {
            return Err(RecordError::StepOutOfRange {
                value: self.step,
                max: MAX_STEP,
            });
        }

        let amounts = [
            ("amount", self.amount),
            ("oldbalanceOrg", self.old_balance_org),
            ("newbalanceOrig", self.new_balance_orig),
            ("oldbalanceDest", self.old_balance_dest),
            ("newbalanceDest", self.new_balance_dest),
        ];
        for (field, value) in amounts {
            if !value.is_finite() {
                return Err(RecordError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(RecordError::Negative { field, value });
            }
        }

        Ok(())
    }
}

impl Default for TransactionRecord {
    /// Values shown when the form is first opened
    fn default() -> Self {
        Self {
            step: 1,
            amount: 1000.0,
            old_balance_org: 5000.0,
            new_balance_orig: 4000.0,
            old_balance_dest: 0.0,
            new_balance_dest: 1000.0,
            transaction_type: TransactionType::Payment,
        }
    }
}
