//! Metrics for harvest runs
//!
//! Counters through the `metrics` facade with standardized naming
//! conventions. Without an installed recorder they cost nothing.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Scholar Harvest metrics
pub const METRICS_PREFIX: &str = "harvest";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_records_processed_total", METRICS_PREFIX),
        Unit::Count,
        "Records stored by a sink"
    );

    describe_counter!(
        format!("{}_records_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Records that failed to decode or to be stored"
    );

    describe_counter!(
        format!("{}_records_dropped_total", METRICS_PREFIX),
        Unit::Count,
        "Records dropped by validation before reaching a sink"
    );

    describe_counter!(
        format!("{}_upserts_total", METRICS_PREFIX),
        Unit::Count,
        "Natural-key upserts by entity and outcome"
    );

    describe_counter!(
        format!("{}_unresolved_references_total", METRICS_PREFIX),
        Unit::Count,
        "Author fragments or organization names that could not be resolved"
    );

    describe_histogram!(
        format!("{}_record_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Time to reconcile one record"
    );

    tracing::debug!("Metrics registered");
}

/// Final state of one record in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Processed,
    Skipped,
    Dropped,
}

impl RecordOutcome {
    fn metric_name(&self) -> String {
        let suffix = match self {
            RecordOutcome::Processed => "processed",
            RecordOutcome::Skipped => "skipped",
            RecordOutcome::Dropped => "dropped",
        };
        format!("{}_records_{}_total", METRICS_PREFIX, suffix)
    }
}

/// Helper to time a record from decode to commit
pub struct RecordMetrics {
    start: Instant,
    kind: &'static str,
}

impl RecordMetrics {
    pub fn start(kind: &'static str) -> Self {
        Self {
            start: Instant::now(),
            kind,
        }
    }

    pub fn finish(self, outcome: RecordOutcome) {
        counter!(outcome.metric_name(), "kind" => self.kind).increment(1);

        if outcome == RecordOutcome::Processed {
            histogram!(
                format!("{}_record_duration_seconds", METRICS_PREFIX),
                "kind" => self.kind
            )
            .record(self.start.elapsed().as_secs_f64());
        }
    }
}

/// Count a record that never got as far as a sink
pub fn record_outcome(kind: &'static str, outcome: RecordOutcome) {
    counter!(outcome.metric_name(), "kind" => kind).increment(1);
}

/// Helper to record an upsert outcome ("inserted", "updated", "unchanged")
pub fn record_upsert(entity: &'static str, outcome: &'static str) {
    counter!(
        format!("{}_upserts_total", METRICS_PREFIX),
        "entity" => entity,
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record a reference that could not be resolved
pub fn record_unresolved(reference: &'static str) {
    counter!(
        format!("{}_unresolved_references_total", METRICS_PREFIX),
        "reference" => reference
    )
    .increment(1);
}
