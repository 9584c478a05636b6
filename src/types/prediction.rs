//! Prediction result data structures

use serde::{Deserialize, Serialize};

/// Binary decision for a scored transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FraudLabel {
    Fraud,
    Legitimate,
}

impl FraudLabel {
    /// Label for a probability at the given decision threshold.
    ///
    /// Only probabilities strictly above the threshold are fraud.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability > threshold {
            FraudLabel::Fraud
        } else {
            FraudLabel::Legitimate
        }
    }

    pub fn is_fraud(&self) -> bool {
        matches!(self, FraudLabel::Fraud)
    }
}

/// Risk band shown alongside the probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Determine risk level from probability and thresholds
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Configurable risk band boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 0.4,
            high: 0.7,
        }
    }
}

/// Round a probability to four decimal places for the response contract.
///
/// Rounds the exact binary value (ties to even) rather than scaling by 1e4,
/// so `0.00035`, stored just below the midpoint, becomes `0.0003`.
pub fn round_probability(probability: f64) -> f64 {
    format!("{:.4}", probability)
        .parse()
        .unwrap_or(probability)
}

/// Response body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: FraudLabel,
    pub fraud_probability: f64,
}

/// Response body of `POST /score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub prediction: FraudLabel,
    pub fraud_probability: f64,
    pub risk_level: RiskLevel,
    pub threshold: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_score() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_score(0.1, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.4, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.69, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.95, &thresholds), RiskLevel::High);
    }

    #[test]
    fn test_label_threshold_is_exclusive() {
        assert_eq!(
            FraudLabel::from_probability(0.5, 0.5),
            FraudLabel::Legitimate
        );
        assert_eq!(FraudLabel::from_probability(0.5001, 0.5), FraudLabel::Fraud);
        assert_eq!(
            FraudLabel::from_probability(0.4999, 0.5),
            FraudLabel::Legitimate
        );
    }

    #[test]
    fn test_round_probability() {
        assert_eq!(round_probability(0.73333), 0.7333);
        assert_eq!(round_probability(0.99996), 1.0);
        assert_eq!(round_probability(0.0), 0.0);
        assert_eq!(round_probability(0.631812), 0.6318);
    }

    #[test]
    fn test_round_probability_uses_exact_value() {
        // 0.00035 is stored as 0.000349999...; scaling by 1e4 would round it up
        assert_eq!(round_probability(0.00035), 0.0003);
        assert_eq!(round_probability(0.26894142), 0.2689);
    }

    #[test]
    fn test_response_contract() {
        let response = PredictionResponse {
            prediction: FraudLabel::Legitimate,
            fraud_probability: round_probability(0.123456),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "prediction": "Legitimate", "fraud_probability": 0.1235 })
        );
    }
}
