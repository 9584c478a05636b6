//! Fixture artifacts shared by unit tests

use crate::config::DetectionConfig;
use crate::models::inference::InferenceEngine;
use crate::models::logistic::LogisticModel;
use crate::schema::ColumnSchema;

pub const FIXTURE_COLUMNS: [&str; 5] = [
    "amount",
    "transaction_type_transfer",
    "transaction_type_withdrawal",
    "channel_mobile",
    "channel_web",
];

pub fn fixture_schema() -> ColumnSchema {
    ColumnSchema::new(FIXTURE_COLUMNS.iter().map(|s| s.to_string()).collect())
        .expect("fixture columns are unique")
}

pub fn fixture_model() -> LogisticModel {
    LogisticModel::new(
        FIXTURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        vec![0.0002, 1.0, 1.5, 1.0, 0.5],
        -2.0,
    )
}

pub fn fixture_engine() -> InferenceEngine {
    InferenceEngine::new(fixture_model(), fixture_schema(), &DetectionConfig::default())
        .expect("fixture model matches fixture schema")
}
