//! Performance metrics and statistics tracking for the assessment service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::risk::{RiskResult, RiskSource};

/// Metrics collector for the assessment service
pub struct EngineMetrics {
    /// Total assessments served
    pub assessments_processed: AtomicU64,
    /// Total panic alerts dispatched
    pub alerts_dispatched: AtomicU64,
    /// Assessments by risk level
    assessments_by_level: RwLock<HashMap<String, u64>>,
    /// Handling times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Rule-score distribution buckets (0-100 in steps of 10)
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl EngineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            assessments_processed: AtomicU64::new(0),
            alerts_dispatched: AtomicU64::new(0),
            assessments_by_level: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one served assessment
    pub fn record_assessment(&self, processing_time: Duration, result: &RiskResult) {
        self.assessments_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut by_level) = self.assessments_by_level.write() {
            *by_level.entry(result.level.as_str().to_string()).or_insert(0) += 1;
        }

        // Bucket rule scores only; model scores are class indices
        if result.source == RiskSource::Rule {
            let bucket = ((result.score / 10.0) as usize).min(9);
            if let Ok(mut buckets) = self.score_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Record one dispatched panic alert
    pub fn record_alert(&self) {
        self.alerts_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Get handling time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (assessments per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessments_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get rule-score distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    /// Get assessments by risk level
    pub fn get_assessments_by_level(&self) -> HashMap<String, u64> {
        self.assessments_by_level.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let assessed = self.assessments_processed.load(Ordering::Relaxed);
        let alerts = self.alerts_dispatched.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let by_level = self.get_assessments_by_level();
        let score_dist = self.get_score_distribution();

        info!("========== SAFETY RISK ENGINE - METRICS SUMMARY ==========");
        info!(
            "Assessments: {} ({:.1}/s) | Panic alerts: {}",
            assessed, throughput, alerts
        );
        info!(
            "Handling time (us): mean={} p50={} p95={} p99={}",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        for (level, count) in &by_level {
            let pct = if assessed > 0 {
                (*count as f64 / assessed as f64) * 100.0
            } else {
                0.0
            };
            info!("  {:>6}: {} ({:.1}%)", level, count, pct);
        }
        let total: u64 = score_dist.iter().sum();
        if total > 0 {
            info!("Rule score distribution:");
            for (i, &count) in score_dist.iter().enumerate() {
                if count > 0 {
                    info!("  {:>3}-{:<3}: {}", i * 10, (i + 1) * 10, count);
                }
            }
        }
        info!("==========================================================");
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Handling time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that prints summaries to the log
pub struct MetricsReporter {
    metrics: std::sync::Arc<EngineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<EngineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
