//! In-process metrics for the bounty board client
//!
//! Counts transaction attempts and outcomes, confirmation latency and
//! proof uploads. `to_json` gives a snapshot of everything recorded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics registry
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    pub async fn inc_counter(&self, name: &str) {
        self.add_counter(name, 1).await;
    }

    pub async fn add_counter(&self, name: &str, value: u64) {
        let counters = self.counters.read().await;
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
            return;
        }
        drop(counters);

        let mut counters = self.counters.write().await;
        counters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .fetch_add(value, Ordering::Relaxed);
    }

    pub async fn get_counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .await
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub async fn observe_histogram(&self, name: &str, value: f64) {
        let histograms = self.histograms.read().await;
        if let Some(histogram) = histograms.get(name) {
            histogram.observe(value);
            return;
        }
        drop(histograms);

        let mut histograms = self.histograms.write().await;
        histograms
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Histogram::default()))
            .observe(value);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn to_json(&self) -> serde_json::Value {
        let counters: HashMap<String, u64> = self
            .counters
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();

        let histograms: HashMap<String, serde_json::Value> = self
            .histograms
            .read()
            .await
            .iter()
            .map(|(k, h)| (k.clone(), h.to_json()))
            .collect();

        serde_json::json!({
            "uptime_seconds": self.uptime_seconds(),
            "counters": counters,
            "histograms": histograms,
        })
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-bucket histogram
pub struct Histogram {
    buckets: Vec<f64>,
    counts: Vec<AtomicU64>,
    /// Sum in milliseconds
    sum_millis: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(buckets: Vec<f64>) -> Self {
        let counts = buckets.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            counts,
            sum_millis: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: f64) {
        self.sum_millis
            .fetch_add((value * 1000.0) as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        if let Some(i) = self.buckets.iter().position(|b| value <= *b) {
            self.counts[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let counts: Vec<u64> = self
            .counts
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect();

        serde_json::json!({
            "buckets": self.buckets,
            "counts": counts,
            "sum": self.sum_millis.load(Ordering::Relaxed) as f64 / 1000.0,
            "count": self.count(),
        })
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // Confirmation waits are seconds to minutes
        Self::new(vec![0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 300.0])
    }
}

/// Metric names
pub mod metric_names {
    pub const TX_ATTEMPTS: &str = "bounty_board.tx.attempts";
    pub const TX_CONFIRMED: &str = "bounty_board.tx.confirmed";
    pub const TX_FAILED: &str = "bounty_board.tx.failed";
    pub const TX_REJECTED_BUSY: &str = "bounty_board.tx.rejected_busy";
    pub const TX_CONFIRMATION_LATENCY: &str = "bounty_board.tx.confirmation_seconds";

    pub const PROOF_FILES_UPLOADED: &str = "bounty_board.proof.files_uploaded";
    pub const PROOF_BYTES_UPLOADED: &str = "bounty_board.proof.bytes_uploaded";
    pub const PROOFS_PACKAGED: &str = "bounty_board.proof.packaged";
    pub const PROOF_PACKAGING_FAILED: &str = "bounty_board.proof.packaging_failed";

    /// Per-kind failure counter, e.g. `bounty_board.tx.failed.user_rejected`
    pub fn tx_failed_kind(kind: &str) -> String {
        format!("{TX_FAILED}.{kind}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter() {
        let registry = MetricsRegistry::new();

        registry.inc_counter("test.counter").await;
        registry.inc_counter("test.counter").await;
        registry.add_counter("test.counter", 5).await;

        assert_eq!(registry.get_counter("test.counter").await, 7);
        assert_eq!(registry.get_counter("missing").await, 0);
    }

    #[tokio::test]
    async fn test_histogram_json() {
        let registry = MetricsRegistry::new();

        registry.observe_histogram("latency", 0.2).await;
        registry.observe_histogram("latency", 3.0).await;
        registry.observe_histogram("latency", 1000.0).await;

        let json = registry.to_json().await;
        let latency = &json["histograms"]["latency"];
        assert_eq!(latency["count"], 3);
        assert_eq!(latency["counts"][0], 1);
        assert_eq!(latency["counts"][3], 1);
    }

    #[test]
    fn test_failed_kind_name() {
        assert_eq!(
            metric_names::tx_failed_kind("network"),
            "bounty_board.tx.failed.network"
        );
    }
}
