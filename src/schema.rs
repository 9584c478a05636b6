//! Column schema shared between training and inference.
//!
//! The schema is the ordered list of feature names a classifier was fitted
//! against. Training produces it once; inference reprojects every request onto
//! it. The classifier indexes features positionally, so the order here is the
//! contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Fields expanded into one-hot indicator columns.
pub const CATEGORICAL_FIELDS: [&str; 5] = [
    "transaction_type",
    "channel",
    "country",
    "time_of_day",
    "device_type",
];

/// Returns true if `field` is one-hot expanded.
pub fn is_categorical(field: &str) -> bool {
    CATEGORICAL_FIELDS.contains(&field)
}

/// Name of the indicator column for `field == value`.
pub fn indicator_column(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}

/// Errors raised while constructing a schema
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("column schema is empty")]
    Empty,
    #[error("duplicate column `{0}` in schema")]
    DuplicateColumn(String),
}

/// What a schema column was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind<'a> {
    /// Numeric field passed through unchanged
    Numeric,
    /// Indicator for one value of a categorical field
    Indicator { field: &'static str, value: &'a str },
}

/// Ordered, duplicate-free list of feature columns.
///
/// Serialized as a plain JSON array of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema, rejecting empty and duplicated column lists.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if index.insert(column.clone(), position).is_some() {
                return Err(SchemaError::DuplicateColumn(column.clone()));
            }
        }

        Ok(Self { columns, index })
    }

    /// Columns in positional order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `column` in the feature vector
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Classify a column name as a numeric pass-through or a categorical indicator.
    pub fn kind_of(column: &str) -> ColumnKind<'_> {
        for field in CATEGORICAL_FIELDS {
            if let Some(value) = column
                .strip_prefix(field)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return ColumnKind::Indicator { field, value };
            }
        }
        ColumnKind::Numeric
    }
}

impl PartialEq for ColumnSchema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for ColumnSchema {}

impl TryFrom<Vec<String>> for ColumnSchema {
    type Error = SchemaError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<ColumnSchema> for Vec<String> {
    fn from(schema: ColumnSchema) -> Self {
        schema.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positions_follow_order() {
        let schema =
            ColumnSchema::new(columns(&["amount", "channel_mobile", "channel_web"])).unwrap();

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.position("amount"), Some(0));
        assert_eq!(schema.position("channel_web"), Some(2));
        assert_eq!(schema.position("channel_atm"), None);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert_eq!(
            ColumnSchema::new(columns(&["amount", "amount"])),
            Err(SchemaError::DuplicateColumn("amount".to_string()))
        );
        assert_eq!(ColumnSchema::new(Vec::new()), Err(SchemaError::Empty));
    }

    #[test]
    fn test_json_is_plain_array() {
        let schema = ColumnSchema::new(columns(&["amount", "country_USA"])).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"["amount","country_USA"]"#);

        let parsed: ColumnSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);

        assert!(serde_json::from_str::<ColumnSchema>(r#"["a","a"]"#).is_err());
    }

    #[test]
    fn test_kind_of() {
        assert_eq!(ColumnSchema::kind_of("amount"), ColumnKind::Numeric);
        assert_eq!(
            ColumnSchema::kind_of("time_of_day_night"),
            ColumnKind::Indicator {
                field: "time_of_day",
                value: "night"
            }
        );
        assert_eq!(
            ColumnSchema::kind_of("country_United_Kingdom"),
            ColumnKind::Indicator {
                field: "country",
                value: "United_Kingdom"
            }
        );
    }
}
