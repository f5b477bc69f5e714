use async_trait::async_trait;
use serde_json::Value;

use super::{Collection, Document, MutateInSpec, MutationResult, UpsertOptions};
use crate::error::StoreError;
use crate::metrics::Metrics;

pub const GET_METRIC: &str = "store.get";
pub const UPSERT_METRIC: &str = "store.upsert";
pub const MUTATE_IN_METRIC: &str = "store.mutate_in";
pub const INSERT_METRIC: &str = "store.insert";
pub const REMOVE_METRIC: &str = "store.remove";

/// Times every call to the inner collection and counts its failures.
///
/// Each operation reports under its own `store.*` name; errors pass through unchanged.
pub struct MeteredCollection<C> {
    metrics: Metrics,
    inner: C,
}

impl<C> MeteredCollection<C> {
    pub fn new(metrics: Metrics, inner: C) -> Self {
        MeteredCollection { metrics, inner }
    }

    /// Access the inner collection.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Collection> Collection for MeteredCollection<C> {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        self.metrics.measure(GET_METRIC, self.inner.get(key)).await
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.metrics
            .measure(UPSERT_METRIC, self.inner.upsert(key, value))
            .await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        self.metrics
            .measure(
                UPSERT_METRIC,
                self.inner.upsert_with_options(key, value, options),
            )
            .await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        self.metrics
            .measure(MUTATE_IN_METRIC, self.inner.mutate_in(key, specs))
            .await
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.metrics
            .measure(INSERT_METRIC, self.inner.insert(key, value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        self.metrics
            .measure(REMOVE_METRIC, self.inner.remove(key))
            .await
    }
}
