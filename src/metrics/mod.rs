//! Latency timers and error counters for store calls.
//!
//! Every instrumented call goes through [`Metrics::measure`]: a success records the timer
//! `<namespace>.<metric>`, a failure increments the counter `<namespace>.<metric>_error`
//! once and records its latency under the timer of the same name. The error itself is
//! returned unchanged.

mod in_memory;
mod recorder;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use in_memory::{InMemoryMetrics, MetricsSnapshot};
pub use recorder::MetricsRecorder;

pub const DEFAULT_NAMESPACE: &str = "cache.docset";

/// Destination for named timers and counters.
pub trait MetricsSink: Send + Sync {
    fn record_timer(&self, name: &str, elapsed: Duration);

    fn increment_counter(&self, name: &str);
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_timer(&self, _name: &str, _elapsed: Duration) {}

    fn increment_counter(&self, _name: &str) {}
}

/// A metrics sink scoped to a namespace. Clone-friendly via Arc.
#[derive(Clone)]
pub struct Metrics {
    sink: Arc<dyn MetricsSink>,
    namespace: Arc<str>,
}

impl Metrics {
    pub fn new(sink: Arc<dyn MetricsSink>, namespace: impl Into<String>) -> Self {
        Metrics {
            sink,
            namespace: Arc::from(namespace.into()),
        }
    }

    /// Metrics under [`DEFAULT_NAMESPACE`].
    pub fn with_sink(sink: Arc<dyn MetricsSink>) -> Self {
        Self::new(sink, DEFAULT_NAMESPACE)
    }

    pub fn noop() -> Self {
        Self::with_sink(Arc::new(NoopMetrics))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fully qualified name of `metric`.
    pub fn name(&self, metric: &str) -> String {
        format!("{}.{}", self.namespace, metric)
    }

    /// Fully qualified name of the failure counter for `metric`.
    pub fn error_name(&self, metric: &str) -> String {
        format!("{}.{}_error", self.namespace, metric)
    }

    /// Awaits `operation`, timing it under `metric`.
    pub async fn measure<F, T, E>(&self, metric: &str, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let started = Instant::now();
        let result = operation.await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => self.sink.record_timer(&self.name(metric), elapsed),
            Err(err) => {
                let name = self.error_name(metric);
                tracing::debug!(metric = %name, error = %err, "store call failed");
                self.sink.increment_counter(&name);
                self.sink.record_timer(&name, elapsed);
            }
        }

        result
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("namespace", &self.namespace)
            .finish()
    }
}
