//! Data augmentation for degenerate inputs.
//!
//! Two mechanical fixes keep training from failing on tiny or single-class
//! tables. Neither has any statistical basis: both inject synthetic or
//! duplicated rows, so evaluation metrics computed after augmentation do not
//! describe real model quality. Do not extend them without new requirements.

use super::dataset::Dataset;
use tracing::warn;

/// Minimum rows each label needs before the table is replicated
pub const MIN_SAMPLES_PER_CLASS: usize = 3;

/// How many copies of the table replace it when a class is under-represented
pub const REPLICATION_FACTOR: usize = 3;

/// What the augmentation step changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentationReport {
    /// A cloned row with the flipped label was appended
    pub synthesized_opposite_class: bool,
    /// Table was replicated this many times (1 = untouched)
    pub replication_factor: usize,
}

impl AugmentationReport {
    pub fn is_noop(&self) -> bool {
        !self.synthesized_opposite_class && self.replication_factor <= 1
    }
}

/// Apply the degenerate-input policies in order:
///
/// 1. If only one label is present, clone the first row with its label
///    flipped.
/// 2. If either label then has fewer than [`MIN_SAMPLES_PER_CLASS`] rows,
///    replicate the whole table [`REPLICATION_FACTOR`] times.
pub fn augment_degenerate_input(dataset: &mut Dataset) -> AugmentationReport {
    let mut report = AugmentationReport {
        synthesized_opposite_class: false,
        replication_factor: 1,
    };

    if dataset.is_empty() {
        return report;
    }

    let counts = dataset.class_counts();
    if counts[0] == 0 || counts[1] == 0 {
        let row = dataset.rows()[0].clone();
        let flipped = 1 - dataset.labels()[0];
        warn!(
            synthesized_label = flipped,
            "Only one class found; appending a cloned row with the opposite label (synthetic data)"
        );
        dataset.push(row, flipped);
        report.synthesized_opposite_class = true;
    }

    let counts = dataset.class_counts();
    if counts.iter().min().copied().unwrap_or(0) < MIN_SAMPLES_PER_CLASS {
        warn!(
            legitimate = counts[0],
            fraud = counts[1],
            factor = REPLICATION_FACTOR,
            "Class below minimum sample count; replicating the dataset (duplicated data)"
        );
        dataset.replicate(REPLICATION_FACTOR);
        report.replication_factor = REPLICATION_FACTOR;
    }

    report
}
