use async_trait::async_trait;
use serde_json::Value;

use super::{Collection, Document, MutateInSpec, MutationResult, UpsertOptions};
use crate::error::StoreError;
use crate::key::prefixed_key;

/// Extra attempts granted to a failed `get`. Writes are never retried.
const GET_RETRIES: usize = 1;

/// Namespaces every key as `{prefix}_{key}`.
///
/// Sits above [`HashingCollection`](super::HashingCollection) so that the digest of an
/// over-long key covers the prefix too. A failed `get` is retried once; if it fails again
/// the error is wrapped in [`StoreError::PrefixedGet`].
pub struct KeyPrefixingCollection<C> {
    prefix: String,
    inner: C,
}

impl<C> KeyPrefixingCollection<C> {
    pub fn new(prefix: impl Into<String>, inner: C) -> Self {
        KeyPrefixingCollection {
            prefix: prefix.into(),
            inner,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Access the inner collection.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn key(&self, key: &str) -> String {
        prefixed_key(&self.prefix, key)
    }
}

#[async_trait]
impl<C: Collection> Collection for KeyPrefixingCollection<C> {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let prefixed = self.key(key);
        let mut attempt = 0;
        loop {
            match self.inner.get(&prefixed).await {
                Ok(document) => return Ok(document),
                Err(err) if attempt < GET_RETRIES => {
                    tracing::debug!(key = %prefixed, error = %err, "retrying failed get");
                    attempt += 1;
                }
                Err(err) => {
                    return Err(StoreError::PrefixedGet {
                        prefix: self.prefix.clone(),
                        key: key.to_string(),
                        source: Box::new(err),
                    })
                }
            }
        }
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.inner.upsert(&self.key(key), value).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        self.inner
            .upsert_with_options(&self.key(key), value, options)
            .await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        self.inner.mutate_in(&self.key(key), specs).await
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.inner.insert(&self.key(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        self.inner.remove(&self.key(key)).await
    }
}
