//! Binary logistic regression: fitting and the persisted model.

use chrono::{DateTime, Utc};
use linfa::{traits::Fit, DatasetBase};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Version of the persisted classifier layout
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,
    #[error("training rows and labels differ in length ({rows} rows, {labels} labels)")]
    LabelCountMismatch { rows: usize, labels: usize },
    #[error("training row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("training labels contain a single class ({0}); both classes are required")]
    SingleClass(u8),
    #[error("invalid label {0}; labels must be 0 or 1")]
    InvalidLabel(u8),
    #[error("solver failed: {0}")]
    Solver(String),
}

/// Fitted logistic-regression classifier.
///
/// Weights are positional and aligned to `columns`, which is a copy of the
/// column schema the model was fitted against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub format_version: u32,
    pub columns: Vec<String>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub trained_at: DateTime<Utc>,
}

impl LogisticModel {
    pub fn new(columns: Vec<String>, weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            columns,
            weights,
            intercept,
            trained_at: Utc::now(),
        }
    }

    /// Number of input features
    pub fn feature_count(&self) -> usize {
        self.weights.len()
    }

    /// Linear score `w·x + b`
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.weights.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }

        Ok(dot(&self.weights, features) + self.intercept)
    }

    /// Probability of the positive (fraud) class
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.decision_function(features).map(sigmoid)
    }

    /// Column name paired with the absolute weight
    pub fn feature_importance(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .cloned()
            .zip(self.weights.iter().map(|w| w.abs()))
            .collect()
    }
}

/// How classes are weighted in the loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Every sample counts the same
    None,
    /// Weight each class by `n_samples / (2 * class_count)`
    #[default]
    Balanced,
}

impl ClassWeight {
    /// Logit offset equivalent to reweighting the classes.
    ///
    /// Weighting class `k` by `w_k` moves the log-odds by `ln(w1 / w0)`; for
    /// balanced weights that is `ln(n0 / n1)`.
    fn intercept_offset(self, class_counts: [usize; 2]) -> f64 {
        match self {
            ClassWeight::None => 0.0,
            ClassWeight::Balanced => (class_counts[0] as f64 / class_counts[1] as f64).ln(),
        }
    }
}

/// Logistic-regression estimator.
///
/// Minimizes log loss plus `||w||^2 / (2c)` with L-BFGS through
/// `linfa-logistic`, on raw feature values.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub c: f64,
    pub max_iter: u64,
    pub tolerance: f64,
    pub class_weight: ClassWeight,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u64) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Fit on row-major `rows` with 0/1 `labels`.
    pub fn fit(
        &self,
        columns: &[String],
        rows: &[Vec<f64>],
        labels: &[u8],
    ) -> Result<LogisticModel, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ModelError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let n_features = columns.len();
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_features {
                return Err(ModelError::RaggedRow {
                    row,
                    expected: n_features,
                    actual: values.len(),
                });
            }
        }

        let mut class_counts = [0usize; 2];
        for &label in labels {
            match label {
                0 | 1 => class_counts[label as usize] += 1,
                other => return Err(ModelError::InvalidLabel(other)),
            }
        }
        if class_counts[0] == 0 || class_counts[1] == 0 {
            return Err(ModelError::SingleClass(labels[0]));
        }

        let records = Array2::from_shape_vec(
            (rows.len(), n_features),
            rows.iter().flatten().copied().collect(),
        )
        .map_err(|e| ModelError::Solver(e.to_string()))?;
        let targets: Array1<usize> = labels.iter().map(|&y| usize::from(y)).collect();
        let dataset = DatasetBase::new(records, targets);

        let fitted = linfa_logistic::LogisticRegression::default()
            .alpha(1.0 / self.c)
            .max_iterations(self.max_iter)
            .gradient_tolerance(self.tolerance)
            .with_intercept(true)
            .fit(&dataset)
            .map_err(|e| ModelError::Solver(e.to_string()))?;

        // the solver picks its own positive class; orient towards fraud
        let sign = if fitted.labels().pos.class == 1 { 1.0 } else { -1.0 };
        let weights: Vec<f64> = fitted.params().iter().map(|w| sign * w).collect();
        let intercept =
            sign * fitted.intercept() + self.class_weight.intercept_offset(class_counts);

        info!(
            features = n_features,
            samples = rows.len(),
            legitimate = class_counts[0],
            fraud = class_counts[1],
            "Fitted logistic regression"
        );

        Ok(LogisticModel::new(columns.to_vec(), weights, intercept))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999);
        assert!(sigmoid(-40.0) < 0.001);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_predict_proba_checks_dimension() {
        let model = LogisticModel::new(columns(2), vec![1.0, -1.0], 0.0);

        assert_eq!(model.predict_proba(&[2.0, 2.0]), Ok(0.5));
        assert_eq!(
            model.predict_proba(&[1.0]),
            Err(ModelError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    fn separable() -> (Vec<Vec<f64>>, Vec<u8>) {
        // Large amounts (in thousands) with the indicator set are fraud.
        let rows = vec![
            vec![0.10, 0.0],
            vec![0.15, 0.0],
            vec![0.12, 1.0],
            vec![0.09, 0.0],
            vec![5.0, 1.0],
            vec![7.0, 1.0],
            vec![6.5, 0.0],
            vec![8.0, 1.0],
        ];
        (rows, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn test_fit_separates_classes() {
        let (rows, labels) = separable();
        let model = LogisticRegression::new().fit(&columns(2), &rows, &labels).unwrap();

        assert_eq!(model.feature_count(), 2);
        assert_eq!(model.columns, columns(2));
        assert!(model.weights[0] > 0.0);
        assert!(model.predict_proba(&[7.5, 1.0]).unwrap() > 0.5);
        assert!(model.predict_proba(&[0.08, 0.0]).unwrap() < 0.5);
    }

    #[test]
    fn test_fit_orients_towards_fraud_label() {
        // Fraud is the majority here; probabilities must still be P(fraud).
        let rows = vec![vec![0.0], vec![0.2], vec![3.0], vec![3.2], vec![3.5], vec![4.0]];
        let labels = vec![0, 0, 1, 1, 1, 1];
        let model = LogisticRegression::new().fit(&columns(1), &rows, &labels).unwrap();

        assert!(model.weights[0] > 0.0);
        assert!(model.predict_proba(&[4.0]).unwrap() > model.predict_proba(&[0.0]).unwrap());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let labels = vec![0, 0, 1, 1];
        let estimator = LogisticRegression::new();

        let a = estimator.fit(&columns(1), &rows, &labels).unwrap();
        let b = estimator.fit(&columns(1), &rows, &labels).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.intercept, b.intercept);
    }

    #[test]
    fn test_balanced_weights_shift_intercept_towards_minority() {
        let rows = vec![vec![0.0], vec![0.5], vec![1.0], vec![1.5], vec![2.0], vec![2.5]];
        let labels = vec![0, 0, 1, 0, 0, 1];

        let plain = LogisticRegression::new()
            .with_class_weight(ClassWeight::None)
            .fit(&columns(1), &rows, &labels)
            .unwrap();
        let balanced = LogisticRegression::new()
            .fit(&columns(1), &rows, &labels)
            .unwrap();

        // 4 legitimate, 2 fraud: ln(4 / 2)
        assert_eq!(plain.weights, balanced.weights);
        assert!((balanced.intercept - plain.intercept - 2.0_f64.ln()).abs() < 1e-12);
        assert_eq!(ClassWeight::Balanced.intercept_offset([5, 5]), 0.0);
    }

    #[test]
    fn test_fit_rejects_degenerate_input() {
        let estimator = LogisticRegression::new();

        assert_eq!(
            estimator.fit(&columns(1), &[], &[]),
            Err(ModelError::EmptyTrainingSet)
        );
        assert_eq!(
            estimator.fit(&columns(1), &[vec![1.0], vec![2.0]], &[1, 1]),
            Err(ModelError::SingleClass(1))
        );
        assert_eq!(
            estimator.fit(&columns(1), &[vec![1.0], vec![2.0]], &[0, 2]),
            Err(ModelError::InvalidLabel(2))
        );
        assert_eq!(
            estimator.fit(&columns(2), &[vec![1.0], vec![2.0]], &[0, 1]),
            Err(ModelError::RaggedRow {
                row: 0,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_feature_importance_is_absolute_weight() {
        let model = LogisticModel::new(columns(2), vec![-2.5, 0.5], 1.0);
        assert_eq!(
            model.feature_importance(),
            vec![("f0".to_string(), 2.5), ("f1".to_string(), 0.5)]
        );
    }
}
