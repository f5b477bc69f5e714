//! Sink forwarding to the `metrics` facade, so any installed exporter picks the values up.

use std::time::Duration;

use ::metrics::{counter, histogram};

use super::MetricsSink;

/// Records timers as histograms in seconds and counters as monotonic counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        MetricsRecorder
    }
}

impl MetricsSink for MetricsRecorder {
    fn record_timer(&self, name: &str, elapsed: Duration) {
        histogram!(name.to_string()).record(elapsed.as_secs_f64());
    }

    fn increment_counter(&self, name: &str) {
        counter!(name.to_string()).increment(1);
    }
}
