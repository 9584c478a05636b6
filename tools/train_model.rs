//! Model Training Job
//!
//! Loads labelled transactions from CSV, builds the column schema, fits the
//! classifier and writes the model, schema and feature-importance artifacts.
//!
//! Usage: train-model [DATA_CSV] [MODELS_DIR]

use anyhow::{Context, Result};
use fraudshield::{
    config::AppConfig,
    logging,
    models::ArtifactStore,
    training::{Dataset, Trainer},
};
use tracing::{info, warn};

fn main() -> Result<()> {
    let mut config = AppConfig::load()?;
    logging::init(&config.logging, "train_model")?;

    info!("Starting model training");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    if let Some(data_path) = args.get(1) {
        config.training.data_path = data_path.clone();
    }
    if let Some(models_dir) = args.get(2) {
        config.artifacts.models_dir = models_dir.clone();
    }

    info!(
        data_path = %config.training.data_path,
        models_dir = %config.artifacts.models_dir,
        test_size = config.training.test_size,
        seed = config.training.seed,
        "Configuration loaded"
    );

    let dataset = Dataset::from_csv_path(&config.training.data_path)
        .with_context(|| format!("Failed to load {}", config.training.data_path))?;

    let trainer = Trainer::new(config.training.clone(), config.detection.threshold);
    let outcome = trainer.run(dataset).context("Training failed")?;

    if !outcome.augmentation.is_noop() {
        warn!(
            synthesized_opposite_class = outcome.augmentation.synthesized_opposite_class,
            replication_factor = outcome.augmentation.replication_factor,
            "Degenerate-input augmentation was applied; evaluation metrics include synthetic or duplicated rows"
        );
    }

    let store = ArtifactStore::new(&config.artifacts);
    store
        .save(&outcome.model, &outcome.schema, &outcome.importance)
        .context("Failed to save artifacts")?;

    for (column, importance) in outcome.importance.ranked(Some(5)) {
        info!(column = %column, importance, "Top feature");
    }

    info!(
        columns = outcome.schema.len(),
        train_rows = outcome.evaluation.train_rows,
        test_rows = outcome.evaluation.test_rows,
        "Training completed successfully"
    );

    Ok(())
}
