//! Inference engine for fraud scoring

use crate::config::{AppConfig, DetectionConfig};
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::{verify_snapshot, ArtifactError, ArtifactStore, LoadedArtifacts};
use crate::models::logistic::{LogisticModel, ModelError};
use crate::schema::ColumnSchema;
use crate::types::prediction::{
    round_probability, FraudLabel, PredictionResponse, RiskLevel, RiskLevelThresholds,
    ScoreResponse,
};
use crate::types::transaction::{TransactionRecord, ValidationError};
use anyhow::{Context, Result};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result of scoring one record
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Binary decision at the engine threshold
    pub label: FraudLabel,
    /// Unrounded fraud probability (0.0 - 1.0)
    pub fraud_probability: f64,
    /// Risk band for the probability
    pub risk_level: RiskLevel,
}

impl PredictionResult {
    /// Public `/predict` contract with a 4-decimal probability
    pub fn to_response(&self) -> PredictionResponse {
        PredictionResponse {
            prediction: self.label,
            fraud_probability: round_probability(self.fraud_probability),
        }
    }

    /// Extended response carrying the risk band and threshold
    pub fn to_score_response(&self, threshold: f64) -> ScoreResponse {
        ScoreResponse {
            prediction: self.label,
            fraud_probability: round_probability(self.fraud_probability),
            risk_level: self.risk_level,
            threshold,
        }
    }
}

/// Scores transaction records against one immutable training snapshot.
///
/// Holds no mutable state, so a single instance can be shared across request
/// handlers.
pub struct InferenceEngine {
    model: LogisticModel,
    extractor: FeatureExtractor,
    threshold: f64,
    risk_levels: RiskLevelThresholds,
}

impl InferenceEngine {
    /// Create an engine from an already-loaded classifier and schema.
    pub fn new(
        model: LogisticModel,
        schema: ColumnSchema,
        detection: &DetectionConfig,
    ) -> Result<Self, ArtifactError> {
        verify_snapshot(&model, &schema)?;

        Ok(Self {
            model,
            extractor: FeatureExtractor::new(Arc::new(schema)),
            threshold: detection.threshold,
            risk_levels: detection.risk_levels.clone(),
        })
    }

    /// Load artifacts named in configuration and build the engine.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = ArtifactStore::new(&config.artifacts);
        let LoadedArtifacts { model, schema } = store
            .load()
            .with_context(|| format!("Failed to load artifacts from {}", config.artifacts.models_dir))?;

        let engine = Self::new(model, schema, &config.detection)?;

        info!(
            features = engine.feature_count(),
            threshold = engine.threshold,
            "Inference engine initialized"
        );

        Ok(engine)
    }

    /// Decision threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_count(&self) -> usize {
        self.extractor.feature_count()
    }

    pub fn schema(&self) -> &ColumnSchema {
        self.extractor.schema()
    }

    pub fn model(&self) -> &LogisticModel {
        &self.model
    }

    /// Score a single record
    pub fn predict(&self, record: &TransactionRecord) -> Result<PredictionResult, InferenceError> {
        let expanded = FeatureExtractor::expand(record);
        let unmatched = self.extractor.unmatched_columns(&expanded);
        if !unmatched.is_empty() {
            debug!(columns = ?unmatched, "Dropping columns absent from schema");
        }

        let features = self.extractor.project(&expanded);
        let fraud_probability = self.model.predict_proba(features.as_slice())?;
        let label = FraudLabel::from_probability(fraud_probability, self.threshold);
        let risk_level = RiskLevel::from_score(fraud_probability, &self.risk_levels);

        debug!(
            fraud_probability,
            label = ?label,
            risk_level = ?risk_level,
            "Record scored"
        );

        Ok(PredictionResult {
            label,
            fraud_probability,
            risk_level,
        })
    }

    /// Score a decoded JSON object
    pub fn predict_json(
        &self,
        object: serde_json::Map<String, serde_json::Value>,
    ) -> Result<PredictionResult, InferenceError> {
        let record = TransactionRecord::from_json(object)?;
        self.predict(&record)
    }
}
