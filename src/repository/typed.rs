use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::collection::Collection;
use crate::error::StoreError;
use crate::metrics::Metrics;

pub const KEY_READ_METRIC: &str = "key.read";
pub const KEY_WRITE_METRIC: &str = "key.write";

/// One typed value per key.
#[async_trait]
pub trait DocumentRepository<T>: Send + Sync {
    /// The stored value, or `None` if nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &T) -> Result<(), StoreError>;
}

/// [`DocumentRepository`] storing `T` as JSON in a [`Collection`].
pub struct TypedRepository<T, C> {
    collection: C,
    metrics: Metrics,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> TypedRepository<T, C> {
    pub fn new(collection: C, metrics: Metrics) -> Self {
        TypedRepository {
            collection,
            metrics,
            _marker: PhantomData,
        }
    }

    /// Access the underlying collection.
    pub fn collection(&self) -> &C {
        &self.collection
    }
}

impl<T, C: Collection> TypedRepository<T, C> {
    /// Store an already-encoded document under `key`.
    pub async fn put_raw(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.metrics
            .measure(KEY_WRITE_METRIC, self.collection.upsert(key, value))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<T, C> DocumentRepository<T> for TypedRepository<T, C>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    C: Collection,
{
    async fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let document = self
            .metrics
            .measure(KEY_READ_METRIC, self.collection.get(key))
            .await?;
        document.map(|doc| doc.content_as()).transpose()
    }

    async fn put(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.put_raw(key, serde_json::to_value(value)?).await
    }
}
