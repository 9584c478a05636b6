//! Transaction data structures for fraud scoring

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Numeric fields every scoring request must carry
pub const REQUIRED_NUMERIC_FIELDS: [&str; 1] = ["amount"];

/// Request validation failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("field `{0}` must be a finite number")]
    NotNumeric(String),
    #[error("field `{0}` must be a number or a string")]
    UnsupportedValue(String),
}

/// A single field value in a transaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// A transaction to be scored, as a validated mapping of field name to value.
///
/// Records are built per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl TransactionRecord {
    /// Build a record, checking that every required numeric field is present
    /// and numeric.
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Result<Self, ValidationError> {
        for required in REQUIRED_NUMERIC_FIELDS {
            match fields.get(required) {
                None => return Err(ValidationError::MissingField(required.to_string())),
                Some(FieldValue::Number(n)) if n.is_finite() => {}
                Some(_) => return Err(ValidationError::NotNumeric(required.to_string())),
            }
        }

        Ok(Self { fields })
    }

    /// Build a record from a decoded JSON object
    pub fn from_json(object: serde_json::Map<String, Value>) -> Result<Self, ValidationError> {
        let mut fields = BTreeMap::new();

        for (name, value) in object {
            let value = match value {
                Value::Number(n) => match n.as_f64() {
                    Some(n) => FieldValue::Number(n),
                    None => return Err(ValidationError::NotNumeric(name)),
                },
                Value::String(s) => FieldValue::Text(s),
                _ => return Err(ValidationError::UnsupportedValue(name)),
            };
            fields.insert(name, value);
        }

        Self::new(fields)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Kind of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Transfer,
    Payment,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [Self::Withdrawal, Self::Transfer, Self::Payment];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Payment => "payment",
        }
    }
}

/// Channel the transaction was initiated through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Mobile,
    Web,
    Atm,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Self::Mobile, Self::Web, Self::Atm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Mobile => "mobile",
            Channel::Web => "web",
            Channel::Atm => "atm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 3] = [Self::Morning, Self::Afternoon, Self::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Night => "night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Android,
    Ios,
    Windows,
}

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [Self::Android, Self::Ios, Self::Windows];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Android => "android",
            DeviceType::Ios => "ios",
            DeviceType::Windows => "windows",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(TransactionType, Channel, TimeOfDay, DeviceType);

/// Strongly typed transaction with the six known fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction amount
    pub amount: f64,

    /// Withdrawal, transfer or payment
    pub transaction_type: TransactionType,

    /// Mobile, web or ATM
    pub channel: Channel,

    /// Country the transaction originated in
    pub country: String,

    /// Morning, afternoon or night
    pub time_of_day: TimeOfDay,

    /// Android, iOS or Windows
    pub device_type: DeviceType,
}

impl Transaction {
    /// Create a new transaction with the given amount and common defaults
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            transaction_type: TransactionType::Payment,
            channel: Channel::Mobile,
            country: "India".to_string(),
            time_of_day: TimeOfDay::Afternoon,
            device_type: DeviceType::Android,
        }
    }

    /// Convert into a record ready for scoring
    pub fn to_record(&self) -> Result<TransactionRecord, ValidationError> {
        let mut fields = BTreeMap::new();
        fields.insert("amount".to_string(), FieldValue::Number(self.amount));
        fields.insert(
            "transaction_type".to_string(),
            self.transaction_type.as_str().into(),
        );
        fields.insert("channel".to_string(), self.channel.as_str().into());
        fields.insert("country".to_string(), self.country.clone().into());
        fields.insert("time_of_day".to_string(), self.time_of_day.as_str().into());
        fields.insert("device_type".to_string(), self.device_type.as_str().into());

        TransactionRecord::new(fields)
    }
}
