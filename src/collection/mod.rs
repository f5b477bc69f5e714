//! Collection - the key-value document store seam.
//!
//! A [`Collection`] offers single-key get/upsert/insert/remove plus bounded sub-document
//! mutation. Implementations compose by delegation: each decorator holds the next collection
//! and forwards every call.
//!
//! ```ignore
//! use docset::{CollectionExt, InMemoryCollection};
//!
//! let collection = InMemoryCollection::new()
//!     .hashing_long_keys()
//!     .with_prefix("offers")
//!     .publish_on(tokio::runtime::Handle::current());
//! ```

mod hashing;
mod in_memory;
mod metered;
mod prefixing;
mod publish_on;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::metrics::Metrics;

pub use hashing::HashingCollection;
pub use in_memory::InMemoryCollection;
pub use metered::MeteredCollection;
pub use prefixing::KeyPrefixingCollection;
pub use publish_on::PublishOnCollection;

/// Maximum number of specs the store accepts in one `mutate_in` request.
pub const MAX_MUTATE_IN_OPERATIONS: usize = 16;

/// A stored document as returned by [`Collection::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub content: Value,
    pub cas: u64,
    /// When the store will expire the document, if it carries a time-to-live.
    pub expiry: Option<Instant>,
}

impl Document {
    /// Decode the content into `T`.
    pub fn content_as<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(T::deserialize(&self.content)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationResult {
    pub cas: u64,
}

/// One path-scoped operation inside a `mutate_in` request. Paths name top-level fields.
#[derive(Debug, Clone, PartialEq)]
pub enum MutateInSpec {
    Upsert { path: String, value: Value },
    Remove { path: String },
}

impl MutateInSpec {
    pub fn upsert(path: impl Into<String>, value: impl Into<Value>) -> Self {
        MutateInSpec::Upsert {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        MutateInSpec::Remove { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            MutateInSpec::Upsert { path, .. } | MutateInSpec::Remove { path } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    pub expiry: Option<Duration>,
}

impl UpsertOptions {
    /// Options for a document living for `ttl`. A zero `ttl` sets no expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        UpsertOptions {
            expiry: (!ttl.is_zero()).then_some(ttl),
        }
    }
}

/// Key-value document store operations.
///
/// `get` reports an absent document as `Ok(None)`. Write-side operations on an absent
/// document fail with [`StoreError::DocumentNotFound`].
#[async_trait]
pub trait Collection: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError>;

    /// Create or replace the whole document, without expiry.
    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        self.upsert_with_options(key, value, UpsertOptions::default())
            .await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError>;

    /// Apply up to [`MAX_MUTATE_IN_OPERATIONS`] specs to one document, all or nothing.
    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError>;

    /// Create the document. Fails with [`StoreError::DocumentExists`] if the key is taken.
    async fn insert(
        &self,
        key: &str,
        value: Value,
    ) -> Result<MutationResult, StoreError>;

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError>;
}

#[async_trait]
impl<C: Collection + ?Sized> Collection for Arc<C> {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(key).await
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        (**self).upsert(key, value).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        (**self).upsert_with_options(key, value, options).await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        (**self).mutate_in(key, specs).await
    }

    async fn insert(
        &self,
        key: &str,
        value: Value,
    ) -> Result<MutationResult, StoreError> {
        (**self).insert(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        (**self).remove(key).await
    }
}

#[async_trait]
impl<'a, C: Collection + ?Sized> Collection for &'a C {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(key).await
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        (**self).upsert(key, value).await
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        (**self).upsert_with_options(key, value, options).await
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        (**self).mutate_in(key, specs).await
    }

    async fn insert(
        &self,
        key: &str,
        value: Value,
    ) -> Result<MutationResult, StoreError> {
        (**self).insert(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        (**self).remove(key).await
    }
}

/// Builder methods wrapping a collection in the standard decorators.
pub trait CollectionExt: Collection + Sized {
    /// Replace keys longer than the store limit by their SHA-256 digest.
    fn hashing_long_keys(self) -> HashingCollection<Self> {
        HashingCollection::new(self)
    }

    fn with_prefix(self, prefix: impl Into<String>) -> KeyPrefixingCollection<Self> {
        KeyPrefixingCollection::new(prefix, self)
    }

    fn publish_on(self, handle: tokio::runtime::Handle) -> PublishOnCollection<Self> {
        PublishOnCollection::new(handle, self)
    }

    fn metered(self, metrics: Metrics) -> MeteredCollection<Self> {
        MeteredCollection::new(metrics, self)
    }
}

impl<C: Collection + Sized> CollectionExt for C {}
