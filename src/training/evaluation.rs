//! Held-out evaluation metrics.
//!
//! Observational only: computed and logged after fitting, never fed back into
//! training or persisted.

use std::fmt;
use tracing::info;

/// Precision, recall and F1 for one label
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class report in the style of a classification summary table
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: [ClassMetrics; 2],
    pub accuracy: f64,
    pub total: usize,
}

impl ClassificationReport {
    /// Build from true and predicted labels of equal length.
    ///
    /// A zero denominator yields 0.0 for that metric.
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let total = y_true.len().min(y_pred.len());
        let pairs = || y_true.iter().zip(y_pred);

        let metrics = |label: u8| {
            let tp = pairs().filter(|(&t, &p)| t == label && p == label).count();
            let predicted = pairs().filter(|(_, &p)| p == label).count();
            let support = pairs().filter(|(&t, _)| t == label).count();

            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            ClassMetrics {
                label,
                precision,
                recall,
                f1,
                support,
            }
        };

        let correct = pairs().filter(|(t, p)| t == p).count();

        Self {
            classes: [metrics(0), metrics(1)],
            accuracy: ratio(correct, total),
            total,
        }
    }

    /// Emit the report through tracing, one line per row
    pub fn log(&self) {
        for line in self.to_string().lines() {
            info!("{}", line);
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }
        write!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )
    }
}

/// Area under the ROC curve from positive-class scores.
///
/// Uses the rank-sum formulation with average ranks for tied scores. Returns
/// `None` when `y_true` holds a single class, where the AUC is undefined.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    let n = y_true.len().min(scores.len());
    let n_pos = y_true[..n].iter().filter(|&&y| y == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start;
        while end + 1 < n && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; ties share the mean rank
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &i in &order[start..=end] {
            ranks[i] = rank;
        }
        start = end + 1;
    }

    let pos_rank_sum: f64 = (0..n).filter(|&i| y_true[i] == 1).map(|i| ranks[i]).sum();
    let n_pos = n_pos as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
