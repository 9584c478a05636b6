//! Classifier, artifact persistence and inference

pub mod inference;
pub mod loader;
pub mod logistic;

pub use inference::{InferenceEngine, InferenceError, PredictionResult};
pub use loader::{ArtifactError, ArtifactStore, FeatureImportance, LoadedArtifacts};
pub use logistic::{ClassWeight, LogisticModel, LogisticRegression, ModelError};
