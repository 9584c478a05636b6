//! Feature extraction for model inference.
//!
//! Expands a transaction record into named columns the same way training
//! does, then reprojects those columns onto the training-time schema so the
//! classifier always sees vectors of the dimensionality and order it was
//! fitted on.
//!
//! Unlike training there is no reference category dropped here: the dropped
//! indicator simply is not in the schema and falls away during projection.
//! A category value never seen in training behaves the same way, leaving all
//! of its field's indicators at zero instead of failing the request.

use crate::schema::{indicator_column, ColumnSchema};
use crate::types::transaction::{FieldValue, TransactionRecord};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Named columns produced by expanding one record
pub type ExpandedColumns = BTreeMap<String, f64>;

/// Numeric input aligned to a column schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Feature extractor that transforms records into model input features.
pub struct FeatureExtractor {
    schema: Arc<ColumnSchema>,
}

impl FeatureExtractor {
    /// Create a feature extractor bound to a training-time schema.
    pub fn new(schema: Arc<ColumnSchema>) -> Self {
        Self { schema }
    }

    /// One-hot expand a record.
    ///
    /// Numeric fields keep their name; each text field becomes a single
    /// `field_value` indicator set to 1.
    pub fn expand(record: &TransactionRecord) -> ExpandedColumns {
        record
            .fields()
            .map(|(name, value)| match value {
                FieldValue::Number(n) => (name.to_string(), *n),
                FieldValue::Text(text) => (indicator_column(name, text), 1.0),
            })
            .collect()
    }

    /// Reproject expanded columns onto the schema.
    ///
    /// Schema columns missing from `expanded` are filled with 0; expanded
    /// columns absent from the schema are dropped.
    pub fn project(&self, expanded: &ExpandedColumns) -> FeatureVector {
        FeatureVector(
            self.schema
                .columns()
                .iter()
                .map(|column| expanded.get(column).copied().unwrap_or(0.0))
                .collect(),
        )
    }

    /// Expanded columns that the schema does not know about
    pub fn unmatched_columns<'a>(&self, expanded: &'a ExpandedColumns) -> Vec<&'a str> {
        expanded
            .keys()
            .filter(|column| !self.schema.contains(column))
            .map(String::as_str)
            .collect()
    }

    /// Expand and project a record in one step.
    pub fn extract(&self, record: &TransactionRecord) -> FeatureVector {
        self.project(&Self::expand(record))
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    /// Get feature names in vector order.
    pub fn feature_names(&self) -> &[String] {
        self.schema.columns()
    }

    pub fn schema(&self) -> &Arc<ColumnSchema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::{Channel, Transaction, TransactionType};

    fn extractor() -> FeatureExtractor {
        let schema = ColumnSchema::new(
            [
                "amount",
                "transaction_type_transfer",
                "transaction_type_withdrawal",
                "channel_mobile",
                "channel_web",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap();
        FeatureExtractor::new(Arc::new(schema))
    }

    fn record(amount: f64, transaction_type: &str, channel: &str) -> TransactionRecord {
        let mut fields = BTreeMap::new();
        fields.insert("amount".to_string(), FieldValue::Number(amount));
        fields.insert("transaction_type".to_string(), transaction_type.into());
        fields.insert("channel".to_string(), channel.into());
        TransactionRecord::new(fields).unwrap()
    }

    #[test]
    fn test_reference_categories_contribute_nothing() {
        let features = extractor().extract(&record(5000.0, "payment", "atm"));
        assert_eq!(features.as_slice(), &[5000.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_known_categories_set_indicators() {
        let features = extractor().extract(&record(200.0, "withdrawal", "mobile"));
        assert_eq!(features.as_slice(), &[200.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let extractor = extractor();
        let features = extractor.extract(&record(75.0, "refund", "kiosk"));
        assert_eq!(features.as_slice(), &[75.0, 0.0, 0.0, 0.0, 0.0]);

        let expanded = FeatureExtractor::expand(&record(75.0, "refund", "kiosk"));
        assert_eq!(
            extractor.unmatched_columns(&expanded),
            vec!["channel_kiosk", "transaction_type_refund"]
        );
    }

    #[test]
    fn test_dimension_matches_schema_for_any_record() {
        let extractor = extractor();

        let mut sparse = BTreeMap::new();
        sparse.insert("amount".to_string(), FieldValue::Number(1.0));
        let sparse = TransactionRecord::new(sparse).unwrap();

        let mut full = Transaction::new(10.0);
        full.transaction_type = TransactionType::Transfer;
        full.channel = Channel::Web;
        let full = full.to_record().unwrap();

        for record in [&sparse, &full] {
            assert_eq!(extractor.extract(record).len(), extractor.feature_count());
        }
        assert_eq!(
            extractor.extract(&full).as_slice(),
            &[10.0, 1.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_projection_is_idempotent() {
        let extractor = extractor();
        let expanded = FeatureExtractor::expand(&record(42.5, "transfer", "web"));

        let first = extractor.project(&expanded);
        let second = extractor.project(&expanded);
        assert_eq!(first, second);
    }

    #[test]
    fn test_expand_has_no_reference_drop() {
        let expanded = FeatureExtractor::expand(&record(1.0, "payment", "atm"));
        assert_eq!(expanded.get("transaction_type_payment"), Some(&1.0));
        assert_eq!(expanded.get("channel_atm"), Some(&1.0));
        assert_eq!(expanded.get("amount"), Some(&1.0));
    }
}
