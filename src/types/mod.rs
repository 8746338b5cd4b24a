//! Type definitions for the fraud detector

pub mod risk;
pub mod transaction;

pub use risk::{PredictionOutcome, RiskLabel, RiskThresholds};
pub use transaction::{TransactionRecord, TransactionType};
