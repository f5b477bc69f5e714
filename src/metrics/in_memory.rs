//! InMemoryMetrics - HashMap-backed metrics sink for tests and embedding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::MetricsSink;

#[derive(Debug, Clone, Default)]
struct TimerStats {
    count: u64,
    total: Duration,
    max: Duration,
}

#[derive(Debug, Default)]
struct Registry {
    timers: HashMap<String, TimerStats>,
    counters: HashMap<String, u64>,
}

/// In-memory metrics sink. Clone-friendly via Arc; clones share the registry.
#[derive(Clone, Default)]
pub struct InMemoryMetrics {
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of every timer and counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        match self.registry.read() {
            Ok(registry) => MetricsSnapshot {
                timers: registry.timers.clone(),
                counters: registry.counters.clone(),
            },
            Err(_) => MetricsSnapshot::default(),
        }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record_timer(&self, name: &str, elapsed: Duration) {
        if let Ok(mut registry) = self.registry.write() {
            let stats = registry.timers.entry(name.to_string()).or_default();
            stats.count += 1;
            stats.total += elapsed;
            stats.max = stats.max.max(elapsed);
        }
    }

    fn increment_counter(&self, name: &str) {
        if let Ok(mut registry) = self.registry.write() {
            *registry.counters.entry(name.to_string()).or_insert(0) += 1;
        }
    }
}

/// Values captured by [`InMemoryMetrics::snapshot`]. Unknown names read as zero.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    timers: HashMap<String, TimerStats>,
    counters: HashMap<String, u64>,
}

impl MetricsSnapshot {
    pub fn timer_count(&self, name: &str) -> u64 {
        self.timers.get(name).map(|t| t.count).unwrap_or(0)
    }

    pub fn timer_total(&self, name: &str) -> Duration {
        self.timers.get(name).map(|t| t.total).unwrap_or_default()
    }

    pub fn timer_max(&self, name: &str) -> Duration {
        self.timers.get(name).map(|t| t.max).unwrap_or_default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn timer_names(&self) -> impl Iterator<Item = &str> {
        self.timers.keys().map(String::as_str)
    }
}
