//! Prometheus metrics for candidate ingestion

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

pub const PATH_SINGLE: &str = "single";
pub const PATH_BULK: &str = "bulk";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref CANDIDATES_INSERTED: IntCounterVec = register(IntCounterVec::new(
        Opts::new("candidates_inserted_total", "Candidates written to the store"),
        &["path"],
    ));

    pub static ref CANDIDATES_SKIPPED: IntCounterVec = register(IntCounterVec::new(
        Opts::new(
            "candidates_skipped_total",
            "Candidates not written because their natural key already existed"
        ),
        &["path"],
    ));

    pub static ref DUPLICATE_CONFLICTS: IntCounterVec = register(IntCounterVec::new(
        Opts::new(
            "candidate_duplicate_conflicts_total",
            "Single-record writes rejected as duplicates"
        ),
        &["operation"],
    ));

    pub static ref BULK_BATCHES_FAILED: IntCounter = register(IntCounter::new(
        "candidate_bulk_batches_failed_total",
        "Bulk ingestions rolled back after a store failure",
    ));

    pub static ref BULK_BATCH_DURATION: Histogram = register(Histogram::with_opts(
        HistogramOpts::new(
            "candidate_bulk_batch_duration_seconds",
            "Wall time of committed bulk ingestions"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    ));
}

// Metric definitions are static and registered once.
fn register<C>(collector: prometheus::Result<C>) -> C
where
    C: prometheus::core::Collector + Clone + 'static,
{
    let collector = collector.expect("invalid metric definition");
    REGISTRY
        .register(Box::new(collector.clone()))
        .expect("metric registered twice");
    collector
}

pub fn record_inserted(path: &str, count: u64) {
    if count > 0 {
        CANDIDATES_INSERTED.with_label_values(&[path]).inc_by(count);
    }
}

pub fn record_skipped(path: &str, count: u64) {
    if count > 0 {
        CANDIDATES_SKIPPED.with_label_values(&[path]).inc_by(count);
    }
}

pub fn record_conflict(operation: &str) {
    DUPLICATE_CONFLICTS.with_label_values(&[operation]).inc();
}

/// Render every registered metric in the Prometheus text format.
pub fn gather() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
