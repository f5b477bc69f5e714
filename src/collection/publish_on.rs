use async_trait::async_trait;
use serde_json::Value;
use tokio::runtime::Handle;

use super::{Collection, Document, MutateInSpec, MutationResult, UpsertOptions};
use crate::error::StoreError;

/// Hands every completion over to a caller-supplied runtime.
///
/// The inner call runs wherever the caller polls it; its result is then delivered through a
/// task spawned on `handle`, so the wake-up of whoever awaits this collection is issued by
/// that runtime's workers rather than by the thread that completed the store call. If the
/// runtime has shut down, results are returned directly.
pub struct PublishOnCollection<C> {
    handle: Handle,
    inner: C,
}

impl<C> PublishOnCollection<C> {
    pub fn new(handle: Handle, inner: C) -> Self {
        PublishOnCollection { handle, inner }
    }

    /// Access the inner collection.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Delivers `result` from a task on the scheduler, or directly if the scheduler is gone.
    async fn publish<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(err) = self.handle.spawn(async {}).await {
            tracing::warn!(error = %err, "scheduler unavailable, completing on the calling thread");
        }
        result
    }
}

#[async_trait]
impl<C: Collection> Collection for PublishOnCollection<C> {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        let result = self.inner.get(key).await;
        self.publish(result).await
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        let result = self.inner.upsert(key, value).await;
        self.publish(result).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        let result = self.inner.upsert_with_options(key, value, options).await;
        self.publish(result).await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        let result = self.inner.mutate_in(key, specs).await;
        self.publish(result).await
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        let result = self.inner.insert(key, value).await;
        self.publish(result).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        let result = self.inner.remove(key).await;
        self.publish(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionExt, InMemoryCollection};
    use serde_json::json;

    #[test]
    fn completes_through_another_runtime() {
        let scheduler = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let caller = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let collection = InMemoryCollection::new().publish_on(scheduler.handle().clone());

        let content = caller.block_on(async {
            collection.upsert("k", json!(1)).await.unwrap();
            collection.get("k").await.unwrap().map(|doc| doc.content)
        });

        assert_eq!(content, Some(json!(1)));
    }

    #[test]
    fn shut_down_scheduler_still_returns_store_result() {
        let scheduler = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .build()
            .unwrap();
        let handle = scheduler.handle().clone();
        scheduler.shutdown_background();
        let caller = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let raw = InMemoryCollection::new();
        let collection = raw.clone().publish_on(handle);

        let (written, missing) = caller.block_on(async {
            (
                collection.upsert("k", json!(1)).await,
                collection.remove("missing").await,
            )
        });

        assert!(written.is_ok());
        assert!(raw.contains("k"));
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn errors_are_forwarded_unchanged() {
        let collection = InMemoryCollection::new().publish_on(Handle::current());

        let err = collection.remove("missing").await.unwrap_err();

        assert_eq!(
            err,
            StoreError::DocumentNotFound {
                key: "missing".into()
            }
        );
    }
}
