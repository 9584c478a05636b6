//! Offline training: augmentation, schema building, fitting and evaluation

pub mod augmentation;
pub mod dataset;
pub mod evaluation;
pub mod schema_builder;
pub mod split;

pub use augmentation::{augment_degenerate_input, AugmentationReport};
pub use dataset::Dataset;
pub use evaluation::{roc_auc, ClassificationReport};
pub use schema_builder::{EncodedDataset, SchemaBuilder};
pub use split::{train_test_split, Split};

use crate::config::TrainingConfig;
use crate::models::loader::FeatureImportance;
use crate::models::logistic::{ClassWeight, LogisticModel, LogisticRegression, ModelError};
use crate::schema::{ColumnSchema, SchemaError};
use crate::types::prediction::FraudLabel;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to read training data from {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("training data has no `{0}` column")]
    MissingLabelColumn(String),
    #[error("row {row}: invalid label `{value}` (expected 0 or 1)")]
    InvalidLabel { row: usize, value: String },
    #[error("row {row}: column `{column}` is not numeric (`{value}`)")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("{rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },
    #[error("training data has no rows")]
    EmptyDataset,
    #[error("test_size must be within (0, 1), got {0}")]
    InvalidTestSize(f64),
    #[error("cannot split {samples} samples with test_size {test_size}: a partition would be empty")]
    EmptySplit { samples: usize, test_size: f64 },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Held-out metrics for one training run
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: ClassificationReport,
    /// `None` when the evaluation split contains a single class
    pub roc_auc: Option<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Everything one training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: LogisticModel,
    pub schema: ColumnSchema,
    pub importance: FeatureImportance,
    pub augmentation: AugmentationReport,
    pub evaluation: Evaluation,
}

/// Runs the full training pipeline on a loaded dataset
pub struct Trainer {
    config: TrainingConfig,
    threshold: f64,
    schema_builder: SchemaBuilder,
}

impl Trainer {
    /// `threshold` is the decision threshold used for held-out predictions.
    pub fn new(config: TrainingConfig, threshold: f64) -> Self {
        Self {
            config,
            threshold,
            schema_builder: SchemaBuilder::new(),
        }
    }

    fn estimator(&self) -> LogisticRegression {
        LogisticRegression::new()
            .with_c(self.config.c)
            .with_max_iter(self.config.max_iter)
            .with_tolerance(self.config.tolerance)
            .with_class_weight(ClassWeight::Balanced)
    }

    pub fn run(&self, mut dataset: Dataset) -> Result<TrainingOutcome, TrainingError> {
        let augmentation = augment_degenerate_input(&mut dataset);
        let counts = dataset.class_counts();
        info!(
            legitimate = counts[0],
            fraud = counts[1],
            "Class distribution"
        );

        let encoded = self.schema_builder.build(&dataset)?;
        info!(columns = encoded.schema.len(), "Built column schema");

        let split = train_test_split(encoded.rows.len(), self.config.test_size, self.config.seed)?;
        let (train_x, train_y) = gather(&encoded, &split.train);
        let (test_x, test_y) = gather(&encoded, &split.test);

        let model = self
            .estimator()
            .fit(encoded.schema.columns(), &train_x, &train_y)?;

        let evaluation = self.evaluate(&model, &test_x, &test_y)?;
        let importance = FeatureImportance::from_model(&model);

        Ok(TrainingOutcome {
            model,
            schema: encoded.schema,
            importance,
            augmentation,
            evaluation: Evaluation {
                train_rows: train_x.len(),
                ..evaluation
            },
        })
    }

    fn evaluate(
        &self,
        model: &LogisticModel,
        rows: &[Vec<f64>],
        labels: &[u8],
    ) -> Result<Evaluation, TrainingError> {
        let mut scores = Vec::with_capacity(rows.len());
        let mut predictions = Vec::with_capacity(rows.len());
        for row in rows {
            let probability = model.predict_proba(row)?;
            let label = FraudLabel::from_probability(probability, self.threshold);
            scores.push(probability);
            predictions.push(u8::from(label.is_fraud()));
        }

        let report = ClassificationReport::from_predictions(labels, &predictions);
        let auc = roc_auc(labels, &scores);

        report.log();
        match auc {
            Some(auc) => info!(roc_auc = auc, "Held-out ROC AUC"),
            None => info!("Held-out ROC AUC undefined: evaluation split has one class"),
        }

        Ok(Evaluation {
            report,
            roc_auc: auc,
            train_rows: 0,
            test_rows: rows.len(),
        })
    }
}

fn gather(encoded: &EncodedDataset, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<u8>) {
    indices
        .iter()
        .map(|&i| (encoded.rows[i].clone(), encoded.labels[i]))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
transaction_id,customer_id,amount,transaction_type,channel,country,time_of_day,device_type,is_fraud
T01,C01,45000,withdrawal,atm,UAE,night,android,1
T02,C02,120,payment,mobile,India,morning,ios,0
T03,C03,300,payment,web,USA,afternoon,windows,0
T04,C04,38000,transfer,web,UAE,night,windows,1
T05,C05,80,payment,mobile,India,afternoon,android,0
T06,C06,52000,withdrawal,atm,UK,night,android,1
T07,C07,450,transfer,mobile,USA,morning,ios,0
T08,C08,900,payment,web,UK,afternoon,windows,0
T09,C09,41000,transfer,atm,UAE,night,android,1
T10,C10,150,payment,mobile,India,morning,ios,0
T11,C11,60,withdrawal,mobile,India,afternoon,ios,0
T12,C12,47000,withdrawal,web,UAE,night,windows,1
";

    fn trainer() -> Trainer {
        Trainer::new(TrainingConfig::default(), 0.5)
    }

    #[test]
    fn test_run_produces_consistent_artifacts() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let outcome = trainer().run(dataset).unwrap();

        assert!(outcome.augmentation.is_noop());
        assert_eq!(outcome.model.columns.as_slice(), outcome.schema.columns());
        assert_eq!(outcome.importance.len(), outcome.schema.len());
        assert_eq!(outcome.evaluation.test_rows, 3);
        assert_eq!(outcome.evaluation.train_rows, 9);
        assert!(outcome.schema.contains("transaction_type_withdrawal"));
        assert!(!outcome.schema.contains("transaction_type_payment"));
        assert!(outcome.schema.columns().iter().all(|c| outcome
            .importance
            .get(c)
            .map_or(false, |v| v >= 0.0)));
    }

    #[test]
    fn test_schema_stable_for_same_seed() {
        let a = trainer().run(Dataset::from_reader(CSV.as_bytes()).unwrap()).unwrap();
        let b = trainer().run(Dataset::from_reader(CSV.as_bytes()).unwrap()).unwrap();

        assert_eq!(a.schema, b.schema);
        assert_eq!(a.model.weights, b.model.weights);
    }

    #[test]
    fn test_single_class_input_still_trains() {
        let csv = "\
amount,channel,is_fraud
100,web,0
200,mobile,0
300,atm,0
400,web,0
";
        let outcome = trainer()
            .run(Dataset::from_reader(csv.as_bytes()).unwrap())
            .unwrap();

        assert!(outcome.augmentation.synthesized_opposite_class);
        assert_eq!(outcome.augmentation.replication_factor, 3);
        assert_eq!(
            outcome.evaluation.train_rows + outcome.evaluation.test_rows,
            15
        );
    }

    #[test]
    fn test_large_withdrawals_score_as_fraud() {
        let outcome = trainer()
            .run(Dataset::from_reader(CSV.as_bytes()).unwrap())
            .unwrap();

        let engine = crate::models::InferenceEngine::new(
            outcome.model,
            outcome.schema,
            &crate::config::DetectionConfig::default(),
        )
        .unwrap();

        let mut risky = crate::types::Transaction::new(50000.0);
        risky.transaction_type = crate::types::transaction::TransactionType::Withdrawal;
        risky.channel = crate::types::transaction::Channel::Atm;
        risky.country = "UAE".to_string();
        risky.time_of_day = crate::types::transaction::TimeOfDay::Night;

        let result = engine.predict(&risky.to_record().unwrap()).unwrap();
        assert_eq!(result.label, FraudLabel::Fraud);

        let safe = crate::types::Transaction::new(100.0);
        let result = engine.predict(&safe.to_record().unwrap()).unwrap();
        assert_eq!(result.label, FraudLabel::Legitimate);
    }
}
