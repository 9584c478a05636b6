//! FraudShield
//!
//! Fraud scoring with a logistic-regression classifier. Training derives a
//! one-hot column schema from labelled transactions; serving reprojects each
//! request onto that schema before scoring.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod server;
pub mod training;
pub mod types;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use feature_extractor::{FeatureExtractor, FeatureVector};
pub use models::inference::{InferenceEngine, PredictionResult};
pub use schema::ColumnSchema;
pub use training::{Dataset, Trainer, TrainingOutcome};
pub use types::{transaction::Transaction, transaction::TransactionRecord};
