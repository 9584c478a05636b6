//! Training artifact persistence

use crate::config::ArtifactsConfig;
use crate::models::logistic::{LogisticModel, MODEL_FORMAT_VERSION};
use crate::schema::{ColumnSchema, SchemaError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode artifact: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid column schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("unsupported model format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },
    #[error("model has {weights} weights for {columns} columns")]
    WeightCount { weights: usize, columns: usize },
    #[error("model columns do not match the column schema (first difference at position {position})")]
    SchemaMismatch { position: usize },
}

/// Column name to non-negative importance (absolute linear weight)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureImportance(BTreeMap<String, f64>);

impl FeatureImportance {
    pub fn from_model(model: &LogisticModel) -> Self {
        Self(model.feature_importance().into_iter().collect())
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.0.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Columns by descending importance, ties broken by name.
    pub fn ranked(&self, top: Option<usize>) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> =
            self.0.iter().map(|(k, &v)| (k.clone(), v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(top) = top {
            ranked.truncate(top);
        }
        ranked
    }
}

/// Classifier and schema verified to be one training snapshot
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub model: LogisticModel,
    pub schema: ColumnSchema,
}

/// Reads and writes the training artifacts in a models directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_path: PathBuf,
    columns_path: PathBuf,
    importance_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(config: &ArtifactsConfig) -> Self {
        Self::in_dir(
            &config.models_dir,
            &config.model_file,
            &config.columns_file,
            &config.importance_file,
        )
    }

    pub fn in_dir<P: AsRef<Path>>(
        models_dir: P,
        model_file: &str,
        columns_file: &str,
        importance_file: &str,
    ) -> Self {
        let dir = models_dir.as_ref();
        Self {
            model_path: dir.join(model_file),
            columns_path: dir.join(columns_file),
            importance_path: dir.join(importance_file),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn columns_path(&self) -> &Path {
        &self.columns_path
    }

    pub fn importance_path(&self) -> &Path {
        &self.importance_path
    }

    /// Load classifier and schema, verifying they describe the same columns.
    pub fn load(&self) -> Result<LoadedArtifacts, ArtifactError> {
        let model: LogisticModel = read_json(&self.model_path)?;
        let schema: ColumnSchema = read_json(&self.columns_path)?;
        verify_snapshot(&model, &schema)?;

        info!(
            model = %self.model_path.display(),
            columns = schema.len(),
            trained_at = %model.trained_at,
            "Loaded model artifacts"
        );

        Ok(LoadedArtifacts { model, schema })
    }

    /// Load the importance mapping if it exists; it is informational only.
    pub fn load_importance(&self) -> Option<FeatureImportance> {
        if !self.importance_path.exists() {
            warn!(path = %self.importance_path.display(), "Feature importance file not found");
            return None;
        }

        match read_json(&self.importance_path) {
            Ok(importance) => Some(importance),
            Err(e) => {
                warn!(error = %e, "Failed to load feature importance, skipping");
                None
            }
        }
    }

    /// Persist classifier, schema and importance, creating the directory.
    pub fn save(
        &self,
        model: &LogisticModel,
        schema: &ColumnSchema,
        importance: &FeatureImportance,
    ) -> Result<(), ArtifactError> {
        verify_snapshot(model, schema)?;

        write_json(&self.model_path, model)?;
        write_json(&self.columns_path, schema)?;
        write_json(&self.importance_path, importance)?;

        info!(
            model = %self.model_path.display(),
            columns = %self.columns_path.display(),
            importance = %self.importance_path.display(),
            "Saved model artifacts"
        );

        Ok(())
    }
}

/// Check that a classifier was fitted against exactly this schema.
pub fn verify_snapshot(model: &LogisticModel, schema: &ColumnSchema) -> Result<(), ArtifactError> {
    if model.format_version != MODEL_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedFormat {
            found: model.format_version,
            expected: MODEL_FORMAT_VERSION,
        });
    }
    if model.weights.len() != model.columns.len() {
        return Err(ArtifactError::WeightCount {
            weights: model.weights.len(),
            columns: model.columns.len(),
        });
    }
    if model.columns.as_slice() != schema.columns() {
        let position = model
            .columns
            .iter()
            .zip(schema.columns())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| model.columns.len().min(schema.len()));
        return Err(ArtifactError::SchemaMismatch { position });
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })
}
