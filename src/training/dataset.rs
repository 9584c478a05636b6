//! Labelled transaction table loaded from CSV

use super::TrainingError;
use crate::schema::is_categorical;
use crate::types::transaction::FieldValue;
use std::io;
use std::path::Path;
use tracing::info;

/// Binary target column
pub const LABEL_COLUMN: &str = "is_fraud";

/// Columns that identify a row but carry no signal
pub const IDENTIFIER_COLUMNS: [&str; 2] = ["transaction_id", "customer_id"];

/// Feature columns plus a 0/1 label per row.
///
/// Categorical fields hold text; every other column holds numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
    labels: Vec<u8>,
}

impl Dataset {
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<FieldValue>>,
        labels: Vec<u8>,
    ) -> Result<Self, TrainingError> {
        if rows.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        if rows.len() != labels.len() {
            return Err(TrainingError::LabelCount {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(TrainingError::RaggedRow {
                row: row + 1,
                expected: columns.len(),
                actual: values.len(),
            });
        }
        if let Some((row, &label)) = labels.iter().enumerate().find(|(_, &l)| l > 1) {
            return Err(TrainingError::InvalidLabel {
                row: row + 1,
                value: label.to_string(),
            });
        }

        Ok(Self {
            columns,
            rows,
            labels,
        })
    }

    /// Load a CSV file with a header row
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, TrainingError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| TrainingError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let dataset = Self::from_csv(reader)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "Loaded training data"
        );
        Ok(dataset)
    }

    /// Load CSV from any reader
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, TrainingError> {
        Self::from_csv(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader),
        )
    }

    fn from_csv<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, TrainingError> {
        let headers = reader.headers()?.clone();

        let label_index = headers
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .ok_or_else(|| TrainingError::MissingLabelColumn(LABEL_COLUMN.to_string()))?;

        // (source index, name) of every kept feature column, in file order
        let kept: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != label_index && !IDENTIFIER_COLUMNS.contains(h))
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut rows = Vec::new();
        let mut labels = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let row_number = index + 1;

            let raw_label = record.get(label_index).unwrap_or_default();
            let label = parse_label(raw_label).ok_or_else(|| TrainingError::InvalidLabel {
                row: row_number,
                value: raw_label.to_string(),
            })?;

            let mut values = Vec::with_capacity(kept.len());
            for (source, name) in &kept {
                let raw = record.get(*source).unwrap_or_default();
                let value = if is_categorical(name) {
                    FieldValue::Text(raw.to_string())
                } else {
                    let number = raw.parse::<f64>().ok().filter(|n| n.is_finite()).ok_or_else(
                        || TrainingError::NonNumeric {
                            column: name.clone(),
                            row: row_number,
                            value: raw.to_string(),
                        },
                    )?;
                    FieldValue::Number(number)
                };
                values.push(value);
            }

            rows.push(values);
            labels.push(label);
        }

        let columns = kept.into_iter().map(|(_, name)| name).collect();
        Self::new(columns, rows, labels)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count per label, indexed by label
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for &label in &self.labels {
            counts[label as usize] += 1;
        }
        counts
    }

    /// Append a row that matches the column layout
    pub(crate) fn push(&mut self, row: Vec<FieldValue>, label: u8) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
        self.labels.push(label);
    }

    /// Repeat every row so the table is `times` copies of itself
    pub(crate) fn replicate(&mut self, times: usize) {
        let rows = self.rows.clone();
        let labels = self.labels.clone();
        for _ in 1..times {
            self.rows.extend(rows.iter().cloned());
            self.labels.extend(labels.iter().copied());
        }
    }
}

fn parse_label(raw: &str) -> Option<u8> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(1),
        "0" | "0.0" | "false" => Some(0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
transaction_id,customer_id,amount,transaction_type,channel,country,time_of_day,device_type,is_fraud
T1,C1,5000,withdrawal,atm,India,night,android,1
T2,C2,120.5,payment,mobile,USA,morning,ios,0
T3,C1,80,transfer,web,UK,afternoon,windows,0
";

    #[test]
    fn test_load_drops_identifiers_and_label() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();

        assert_eq!(
            dataset.columns(),
            &["amount", "transaction_type", "channel", "country", "time_of_day", "device_type"]
        );
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.labels(), &[1, 0, 0]);
        assert_eq!(dataset.class_counts(), [2, 1]);
        assert_eq!(dataset.rows()[1][0], FieldValue::Number(120.5));
        assert_eq!(dataset.rows()[0][3], FieldValue::Text("India".into()));
    }

    #[test]
    fn test_missing_label_column() {
        let err = Dataset::from_reader("amount,channel\n1,web\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::MissingLabelColumn(ref c) if c == "is_fraud"));
    }

    #[test]
    fn test_non_numeric_feature_names_row_and_column() {
        let err =
            Dataset::from_reader("amount,channel,is_fraud\n12,web,0\nabc,atm,1\n".as_bytes())
                .unwrap_err();
        match err {
            TrainingError::NonNumeric { column, row, value } => {
                assert_eq!(column, "amount");
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_label_and_empty_table() {
        let err = Dataset::from_reader("amount,is_fraud\n1,maybe\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::InvalidLabel { row: 1, .. }));

        let err = Dataset::from_reader("amount,is_fraud\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::EmptyDataset));
    }

    #[test]
    fn test_boolean_labels() {
        let dataset = Dataset::from_reader("amount,is_fraud\n1,True\n2,false\n".as_bytes()).unwrap();
        assert_eq!(dataset.labels(), &[1, 0]);
    }

    #[test]
    fn test_replicate() {
        let mut dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        dataset.replicate(3);
        assert_eq!(dataset.len(), 9);
        assert_eq!(dataset.class_counts(), [6, 3]);
        assert_eq!(dataset.rows()[3], dataset.rows()[0]);
    }
}
