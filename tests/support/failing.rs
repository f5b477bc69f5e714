use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use docset::{
    Collection, Document, InMemoryCollection, MutateInSpec, MutationResult, StoreError,
    UpsertOptions,
};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Upsert,
    MutateIn,
    Insert,
    Remove,
}

/// In-memory collection whose selected operations fail with a backend timeout.
#[derive(Default)]
pub struct FailingCollection {
    inner: InMemoryCollection,
    failing: Mutex<HashSet<Operation>>,
}

impl FailingCollection {
    pub fn new(inner: InMemoryCollection) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, operation: Operation) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        self.failing.lock().unwrap().remove(&operation);
    }

    fn check(&self, operation: Operation) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(&operation) {
            Err(StoreError::Backend("timeout?".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Collection for FailingCollection {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        self.check(Operation::Get)?;
        self.inner.get(key).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        self.check(Operation::Upsert)?;
        self.inner.upsert_with_options(key, value, options).await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        self.check(Operation::MutateIn)?;
        self.inner.mutate_in(key, specs).await
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.check(Operation::Insert)?;
        self.inner.insert(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        self.check(Operation::Remove)?;
        self.inner.remove(key).await
    }
}
