use async_trait::async_trait;
use serde_json::Value;

use super::{Collection, Document, MutateInSpec, MutationResult, UpsertOptions};
use crate::error::StoreError;
use crate::key::prepare_key;

/// Adapter that keeps every key within the store's length limit.
///
/// Keys longer than [`MAX_KEY_LENGTH`](crate::key::MAX_KEY_LENGTH) bytes are replaced by
/// their SHA-256 hex digest on every operation, so a document written under a long key is
/// found again by the same logical key.
pub struct HashingCollection<C> {
    inner: C,
}

impl<C> HashingCollection<C> {
    pub fn new(inner: C) -> Self {
        HashingCollection { inner }
    }

    /// Access the inner collection.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Collection> Collection for HashingCollection<C> {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        self.inner.get(&prepare_key(key)).await
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.inner.upsert(&prepare_key(key), value).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        self.inner
            .upsert_with_options(&prepare_key(key), value, options)
            .await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        self.inner.mutate_in(&prepare_key(key), specs).await
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.inner.insert(&prepare_key(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        self.inner.remove(&prepare_key(key)).await
    }
}
