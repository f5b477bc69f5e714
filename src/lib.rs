//! Typed documents and named sets on top of a key-value document store.
//!
//! The store only offers single-key get/upsert/insert/remove and sub-document mutation of at
//! most 16 paths per request. [`TypedRepository`] stores one value per key;
//! [`SetRepository`] emulates a mutable set with one dictionary document plus one document per
//! member, reconciling members that expired on their own when the set is read.
//!
//! ```ignore
//! use docset::{InMemoryCollection, Metrics, RepositoryConfig, SetEntry, SetRepository};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, SetEntry)]
//! struct Offer {
//!     id: String,
//!     price: u64,
//! }
//!
//! let config = RepositoryConfig::from_env();
//! let offers = SetRepository::<Offer, _>::new(
//!     config.collection(InMemoryCollection::new()),
//!     Metrics::noop(),
//! );
//! offers.add("user-1", &user_offers, Duration::from_secs(60)).await?;
//! let current = offers.get("user-1").await?;
//! ```

extern crate self as docset;

mod collection;
mod config;
mod error;
pub mod key;
pub mod metrics;
mod repository;

pub use collection::{
    Collection, CollectionExt, Document, HashingCollection, InMemoryCollection,
    KeyPrefixingCollection, MeteredCollection, MutateInSpec, MutationResult,
    PublishOnCollection, UpsertOptions, MAX_MUTATE_IN_OPERATIONS,
};
pub use config::RepositoryConfig;
pub use error::StoreError;
pub use self::metrics::{InMemoryMetrics, Metrics, MetricsRecorder, MetricsSink, NoopMetrics};
pub use repository::{DocumentRepository, SetEntry, SetRepository, TypedRepository};

// Derive macro for SetEntry
pub use docset_macros::SetEntry;
