use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use docset::{
    Collection, Document, InMemoryCollection, MutateInSpec, MutationResult, StoreError,
    UpsertOptions,
};
use serde_json::{json, Value};

/// In-memory collection where another writer creates the missing document right after the
/// first `mutate_in` that finds nothing, so the caller's follow-up `insert` collides.
pub struct RacingCollection {
    inner: InMemoryCollection,
    raced: AtomicBool,
}

impl RacingCollection {
    pub fn new(inner: InMemoryCollection) -> Self {
        Self {
            inner,
            raced: AtomicBool::new(false),
        }
    }

    pub fn raced(&self) -> bool {
        self.raced.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collection for RacingCollection {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(key).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        self.inner.upsert_with_options(key, value, options).await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        let result = self.inner.mutate_in(key, specs).await;
        if matches!(&result, Err(err) if err.is_not_found()) && !self.raced.swap(true, Ordering::SeqCst)
        {
            self.inner.insert(key, json!({"other": 1})).await?;
        }
        result
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.inner.insert(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        self.inner.remove(key).await
    }
}
