//! Schema Builder: one-hot expansion of a training table.
//!
//! Each categorical field is replaced in place by indicator columns for its
//! observed values, sorted lexicographically, with the first value dropped as
//! the reference category. Blank cells are treated as missing: they add no
//! category and encode as zero in every indicator. Numeric fields pass
//! through unchanged.

use super::dataset::Dataset;
use super::TrainingError;
use crate::schema::{indicator_column, ColumnSchema, CATEGORICAL_FIELDS};
use crate::types::transaction::FieldValue;
use std::collections::BTreeSet;
use tracing::debug;

/// Numeric training matrix with the schema describing its columns
#[derive(Debug, Clone)]
pub struct EncodedDataset {
    pub schema: ColumnSchema,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

/// How one output column is computed from a source row
#[derive(Debug, Clone)]
enum ColumnPlan {
    Passthrough { source: usize },
    Indicator { source: usize, value: String },
}

pub struct SchemaBuilder {
    categorical_fields: Vec<String>,
}

impl SchemaBuilder {
    /// Builder for the standard categorical transaction fields
    pub fn new() -> Self {
        Self::with_fields(CATEGORICAL_FIELDS.iter().map(|f| f.to_string()).collect())
    }

    pub fn with_fields(categorical_fields: Vec<String>) -> Self {
        Self { categorical_fields }
    }

    /// Derive the column schema and encode every row against it.
    pub fn build(&self, dataset: &Dataset) -> Result<EncodedDataset, TrainingError> {
        let mut names = Vec::new();
        let mut plans = Vec::new();

        for (source, column) in dataset.columns().iter().enumerate() {
            if !self.categorical_fields.contains(column) {
                names.push(column.clone());
                plans.push(ColumnPlan::Passthrough { source });
                continue;
            }

            let observed: BTreeSet<String> = dataset
                .rows()
                .iter()
                .filter_map(|row| category(&row[source]))
                .collect();
            let mut values = observed.into_iter();
            let reference = values.next();
            debug!(field = %column, reference = ?reference, "Dropping reference category");

            for value in values {
                names.push(indicator_column(column, &value));
                plans.push(ColumnPlan::Indicator { source, value });
            }
        }

        let schema = ColumnSchema::new(names)?;

        let mut rows = Vec::with_capacity(dataset.len());
        for (index, row) in dataset.rows().iter().enumerate() {
            let mut encoded = Vec::with_capacity(plans.len());
            for plan in &plans {
                let value = match plan {
                    ColumnPlan::Passthrough { source } => match &row[*source] {
                        FieldValue::Number(n) => *n,
                        FieldValue::Text(text) => {
                            return Err(TrainingError::NonNumeric {
                                column: dataset.columns()[*source].clone(),
                                row: index + 1,
                                value: text.clone(),
                            })
                        }
                    },
                    ColumnPlan::Indicator { source, value } => {
                        if category(&row[*source]).as_ref() == Some(value) {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                encoded.push(value);
            }
            rows.push(encoded);
        }

        Ok(EncodedDataset {
            schema,
            rows,
            labels: dataset.labels().to_vec(),
        })
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Category named by a cell, `None` for a blank one
fn category(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(text) if text.trim().is_empty() => None,
        FieldValue::Text(text) => Some(text.clone()),
        FieldValue::Number(n) => Some(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnKind;

    const CSV: &str = "\
transaction_id,customer_id,amount,transaction_type,channel,is_fraud
T1,C1,5000,withdrawal,atm,1
T2,C2,200,payment,mobile,0
T3,C3,80,transfer,web,0
T4,C4,950,withdrawal,mobile,1
";

    fn encoded() -> EncodedDataset {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        SchemaBuilder::new().build(&dataset).unwrap()
    }

    #[test]
    fn test_drop_first_in_place_layout() {
        assert_eq!(
            encoded().schema.columns(),
            &[
                "amount",
                "transaction_type_transfer",
                "transaction_type_withdrawal",
                "channel_mobile",
                "channel_web",
            ]
        );
    }

    #[test]
    fn test_rows_are_encoded() {
        let encoded = encoded();
        assert_eq!(encoded.rows[0], vec![5000.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(encoded.rows[1], vec![200.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(encoded.rows[2], vec![80.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(encoded.labels, vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_categorical_columns_move_in_place() {
        let csv = "channel,amount,country,is_fraud\nweb,1,UK,0\natm,2,USA,1\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        let encoded = SchemaBuilder::new().build(&dataset).unwrap();

        assert_eq!(encoded.schema.columns(), &["channel_web", "amount", "country_USA"]);
    }

    #[test]
    fn test_schema_is_stable_across_runs() {
        assert_eq!(encoded().schema, encoded().schema);
    }

    #[test]
    fn test_every_column_round_trips() {
        for column in encoded().schema.columns() {
            match ColumnSchema::kind_of(column) {
                ColumnKind::Numeric => assert_eq!(column, "amount"),
                ColumnKind::Indicator { field, value } => {
                    assert!(CATEGORICAL_FIELDS.contains(&field));
                    assert!(!value.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_blank_category_is_missing_not_reference() {
        let csv = "amount,channel,is_fraud\n1,atm,0\n2,mobile,1\n3,web,0\n4,,1\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        let encoded = SchemaBuilder::new().build(&dataset).unwrap();

        assert_eq!(
            encoded.schema.columns(),
            &["amount", "channel_mobile", "channel_web"]
        );
        assert_eq!(encoded.rows[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(encoded.rows[3], vec![4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_valued_field_produces_no_columns() {
        let csv = "amount,device_type,is_fraud\n1,ios,0\n2,ios,1\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        let encoded = SchemaBuilder::new().build(&dataset).unwrap();

        assert_eq!(encoded.schema.columns(), &["amount"]);
    }
}
