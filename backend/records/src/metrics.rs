//! # Metrics
//!
//! Counters are reported through the [`Metrics`] trait so handlers and the notification worker
//! never touch process-wide state directly.
//!
//! - `feedback_total`: feedback stored
//! - `feedback_duplicates_total`: feedback skipped as a duplicate of the latest record
//! - `feedback_errors{source}`: parse, storage and notification failures
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, describe_counter};

pub trait Metrics: Send + Sync {
    fn feedback_stored(&self);

    fn feedback_duplicate(&self);

    fn error(&self, source: &'static str);
}

/// Forwards to the global `metrics` recorder, normally the Prometheus exporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    pub fn new() -> Self {
        describe_counter!("feedback_total", "the times feedback was given");
        describe_counter!(
            "feedback_duplicates_total",
            "the times feedback was skipped as a duplicate"
        );
        describe_counter!("feedback_errors", "the times errors occured");

        Self
    }
}

impl Metrics for PrometheusMetrics {
    fn feedback_stored(&self) {
        counter!("feedback_total", 1);
    }

    fn feedback_duplicate(&self) {
        counter!("feedback_duplicates_total", 1);
    }

    fn error(&self, source: &'static str) {
        counter!("feedback_errors", 1, "source" => source);
    }
}

/// In-process counters, mostly for tests.
#[derive(Debug, Default)]
pub struct CounterMetrics {
    stored: AtomicU64,
    duplicates: AtomicU64,
    errors: AtomicU64,
    notification_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub stored: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub notification_errors: u64,
}

impl CounterMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            stored: self.stored.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            notification_errors: self.notification_errors.load(Ordering::Relaxed),
        }
    }
}

impl Metrics for CounterMetrics {
    fn feedback_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    fn feedback_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    fn error(&self, source: &'static str) {
        self.errors.fetch_add(1, Ordering::Relaxed);

        if source.starts_with("notification") {
            self.notification_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}
