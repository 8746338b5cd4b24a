//! Prediction counters and latency statistics.

use crate::types::risk::RiskLabel;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector shared by request handlers
pub struct PredictionMetrics {
    /// Predictions that produced a label
    pub predictions_served: AtomicU64,
    /// Predictions that failed (invalid record or shape error)
    pub predictions_failed: AtomicU64,
    /// Predictions whose label came from a sample override
    pub overrides_applied: AtomicU64,
    /// Labels handed out
    labels: RwLock<HashMap<RiskLabel, u64>>,
    /// Inference latency (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            overrides_applied: AtomicU64::new(0),
            labels: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(
        &self,
        latency: Duration,
        probability: f64,
        label: RiskLabel,
        overridden: bool,
    ) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if overridden {
            self.overrides_applied.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = (probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut labels) = self.labels.write() {
            *labels.entry(label).or_insert(0) += 1;
        }
    }

    /// Record a prediction that returned an error
    pub fn record_failure(&self) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Latency percentiles over the retained samples
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Predictions per second since start
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or_default()
    }

    pub fn labels(&self) -> HashMap<RiskLabel, u64> {
        self.labels.read().map(|l| l.clone()).unwrap_or_default()
    }

    /// Point-in-time copy for the API
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            overrides_applied: self.overrides_applied.load(Ordering::Relaxed),
            labels: self.labels(),
            latency: self.latency_stats(),
            score_distribution: self.score_distribution(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.predictions_failed.load(Ordering::Relaxed);
        let overrides = self.overrides_applied.load(Ordering::Relaxed);
        let latency = self.latency_stats();
        let labels = self.labels();

        info!(
            served = served,
            failed = failed,
            overrides = overrides,
            throughput = format!("{:.2} req/s", self.throughput()),
            "Prediction summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Inference latency"
        );
        for label in [RiskLabel::Safe, RiskLabel::Warning, RiskLabel::Fraud] {
            let count = labels.get(&label).copied().unwrap_or(0);
            let pct = if served > 0 {
                (count as f64 / served as f64) * 100.0
            } else {
                0.0
            };
            info!(label = %label, count = count, "{:>5.1}% of predictions", pct);
        }

        let distribution = self.score_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = (count as f64 / total as f64) * 100.0;
            let bar = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "  p {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics in microseconds
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of the collected metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub predictions_failed: u64,
    pub overrides_applied: u64,
    pub labels: HashMap<RiskLabel, u64>,
    pub latency: LatencyStats,
    pub score_distribution: [u64; 10],
    pub uptime_secs: u64,
}

/// Prints a metrics summary at a fixed interval
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // the first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
