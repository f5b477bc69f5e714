//! Repository configuration.

use std::sync::Arc;

use serde::Deserialize;

use crate::collection::{Collection, CollectionExt, HashingCollection, KeyPrefixingCollection};
use crate::metrics::{Metrics, MetricsSink, DEFAULT_NAMESPACE};

pub const KEY_PREFIX_ENV: &str = "DOCSET_KEY_PREFIX";
pub const METRIC_NAMESPACE_ENV: &str = "DOCSET_METRIC_NAMESPACE";

/// Settings shared by the repositories of one application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Namespace prepended to every logical key as `{key_prefix}_{key}`.
    pub key_prefix: String,
    /// Prefix of every metric name.
    pub metric_namespace: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            key_prefix: "docset".to_string(),
            metric_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Defaults, overridden by `DOCSET_KEY_PREFIX` and `DOCSET_METRIC_NAMESPACE` when set.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(prefix) = lookup(KEY_PREFIX_ENV).filter(|v| !v.is_empty()) {
            self.key_prefix = prefix;
        }
        if let Some(namespace) = lookup(METRIC_NAMESPACE_ENV).filter(|v| !v.is_empty()) {
            self.metric_namespace = namespace;
        }
        self
    }

    /// Wrap a raw store collection: prefix first, then hash keys past the length limit.
    pub fn collection<C: Collection>(&self, raw: C) -> KeyPrefixingCollection<HashingCollection<C>> {
        raw.hashing_long_keys().with_prefix(self.key_prefix.clone())
    }

    pub fn metrics(&self, sink: Arc<dyn MetricsSink>) -> Metrics {
        Metrics::new(sink, self.metric_namespace.clone())
    }
}
