//! Serving statistics for the scoring API.
//!
//! Purely observational: nothing here feeds back into scoring.

use crate::models::inference::PredictionResult;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile estimates
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for scoring requests
pub struct ServingMetrics {
    /// Requests that produced a prediction
    pub requests_scored: AtomicU64,
    /// Predictions labelled fraud
    pub fraud_predictions: AtomicU64,
    /// Requests rejected by validation
    pub requests_rejected: AtomicU64,
    /// Scoring times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Probability distribution in tenths
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ServingMetrics {
    pub fn new() -> Self {
        Self {
            requests_scored: AtomicU64::new(0),
            fraud_predictions: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a scored request
    pub fn record_prediction(&self, processing_time: Duration, result: &PredictionResult) {
        self.requests_scored.fetch_add(1, Ordering::Relaxed);
        if result.label.is_fraud() {
            self.fraud_predictions.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = (result.fraud_probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a request rejected before scoring
    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or_default()
    }

    /// Point-in-time view served by `GET /stats`
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_scored: self.requests_scored.load(Ordering::Relaxed),
            fraud_predictions: self.fraud_predictions.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
            throughput: self.get_throughput(),
            latency: self.get_processing_stats(),
            score_distribution: self.get_score_distribution(),
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let stats = self.snapshot();
        let fraud_rate = if stats.requests_scored > 0 {
            stats.fraud_predictions as f64 / stats.requests_scored as f64 * 100.0
        } else {
            0.0
        };

        info!(
            scored = stats.requests_scored,
            rejected = stats.requests_rejected,
            fraud_rate = format!("{:.1}%", fraud_rate),
            throughput = format!("{:.2} req/s", stats.throughput),
            mean_us = stats.latency.mean_us,
            p99_us = stats.latency.p99_us,
            "Serving summary"
        );

        let total: u64 = stats.score_distribution.iter().sum();
        if total == 0 {
            return;
        }
        for (i, &count) in stats.score_distribution.iter().enumerate() {
            let pct = count as f64 / total as f64 * 100.0;
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                "█".repeat(((pct / 5.0) as usize).min(20))
            );
        }
    }
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub requests_scored: u64,
    pub fraud_predictions: u64,
    pub requests_rejected: u64,
    pub uptime_secs: u64,
    pub throughput: f64,
    pub latency: ProcessingStats,
    pub score_distribution: [u64; 10],
}

/// Periodically logs a serving summary
pub struct MetricsReporter {
    metrics: Arc<ServingMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServingMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::{FraudLabel, RiskLevel};

    fn result(probability: f64, label: FraudLabel) -> PredictionResult {
        PredictionResult {
            label,
            fraud_probability: probability,
            risk_level: RiskLevel::Low,
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ServingMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), &result(0.2, FraudLabel::Legitimate));
        metrics.record_prediction(Duration::from_micros(300), &result(0.8, FraudLabel::Fraud));
        metrics.record_prediction(Duration::from_micros(200), &result(1.0, FraudLabel::Fraud));
        metrics.record_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_scored, 3);
        assert_eq!(snapshot.fraud_predictions, 2);
        assert_eq!(snapshot.requests_rejected, 1);
        assert_eq!(snapshot.score_distribution[2], 1);
        assert_eq!(snapshot.score_distribution[8], 1);
        // probability 1.0 lands in the top bucket
        assert_eq!(snapshot.score_distribution[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ServingMetrics::new();
        assert_eq!(metrics.get_processing_stats(), ProcessingStats::default());

        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), &result(0.1, FraudLabel::Legitimate));
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }
}
