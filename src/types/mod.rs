//! Type definitions for fraud scoring

pub mod prediction;
pub mod transaction;

pub use prediction::{FraudLabel, PredictionResponse, RiskLevel, RiskLevelThresholds, ScoreResponse};
pub use transaction::{FieldValue, Transaction, TransactionRecord, ValidationError};
