//! SetRepository - a named set of typed members on top of single-key documents.
//!
//! A set stored at `key` is one dictionary document mapping each member identifier to a
//! placeholder, plus one member document per identifier at `{key}_{identifier}`.
//!
//! - `add` writes the member documents first (concurrently), then records their identifiers in
//!   the dictionary in sequential batches of at most [`MAX_MUTATE_IN_OPERATIONS`]. A missing
//!   dictionary is created by `insert`.
//! - `get` reads the dictionary, then every member document concurrently. Identifiers whose
//!   member document is gone (expired or removed out of band) are dropped from the result and
//!   removed from the dictionary.
//! - `remove` drops identifiers from the dictionary batch by batch, removing each batch's member
//!   documents once its dictionary update is done.
//!
//! Dictionary and members are not updated atomically. A failed `add` can leave member documents
//! without dictionary entries; readers never see them and they expire on their own ttl. Dropping
//! a pending `add` or `remove` stops further batches but does not undo finished writes.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::Duration;

use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::collection::{
    Collection, Document, MutateInSpec, MutationResult, UpsertOptions, MAX_MUTATE_IN_OPERATIONS,
};
use crate::error::StoreError;
use crate::key::member_key;
use crate::metrics::Metrics;

pub const SET_WRITE_METRIC: &str = "set.write";
pub const SET_WRITE_ITEM_METRIC: &str = "set.write.item";
pub const SET_MUTATE_DICTIONARY_METRIC: &str = "set.mutate.dictionary";
pub const SET_WRITE_DICTIONARY_METRIC: &str = "set.write.dictionary";
pub const SET_READ_METRIC: &str = "set.read";
pub const SET_READ_DICTIONARY_METRIC: &str = "set.read.dictionary";
pub const SET_READ_ITEM_METRIC: &str = "set.read.item";
pub const SET_REMOVE_METRIC: &str = "set.remove";
pub const SET_REMOVE_DICTIONARY_METRIC: &str = "set.remove.dictionary";
pub const SET_REMOVE_ITEM_METRIC: &str = "set.remove.item";
pub const SET_REMOVE_EVICTED_METRIC: &str = "set.remove.evicteddictionary";

/// Value stored against every identifier in a dictionary document.
const PLACEHOLDER: i32 = 1;

/// A value that can be a set member.
///
/// The identifier names the member inside its set: it is the dictionary entry and the suffix
/// of the member document key. Two members with the same identifier overwrite each other.
pub trait SetEntry {
    fn identifier(&self) -> String;
}

pub struct SetRepository<T, C> {
    collection: C,
    metrics: Metrics,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> SetRepository<T, C> {
    pub fn new(collection: C, metrics: Metrics) -> Self {
        SetRepository {
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

impl<T, C> SetRepository<T, C>
where
    T: SetEntry + Serialize + DeserializeOwned + Eq + Hash + Send + Sync,
    C: Collection,
{
    /// Add a single member. See [`add`](Self::add).
    pub async fn add_one(&self, key: &str, value: &T, ttl: Duration) -> Result<(), StoreError> {
        self.add(key, [value], ttl).await
    }

    /// Add `values` to the set at `key`, each member document living for `ttl`
    /// (zero means no expiry).
    pub async fn add<'a, I>(&self, key: &str, values: I, ttl: Duration) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.metrics
            .measure(SET_WRITE_METRIC, async {
                let options = UpsertOptions::with_ttl(ttl);
                let writes = values
                    .into_iter()
                    .map(|value| self.write_item(key, value, options));
                let identifiers: BTreeSet<String> =
                    try_join_all(writes).await?.into_iter().collect();
                let identifiers: Vec<String> = identifiers.into_iter().collect();

                for batch in identifiers.chunks(MAX_MUTATE_IN_OPERATIONS) {
                    self.insert_keys_to_index(key, batch).await?;
                }
                Ok::<_, StoreError>(())
            })
            .await
    }

    /// Members of the set at `key`. An absent set is empty.
    pub async fn get(&self, key: &str) -> Result<HashSet<T>, StoreError> {
        self.metrics
            .measure(SET_READ_METRIC, async {
                let dictionary = self
                    .metrics
                    .measure(SET_READ_DICTIONARY_METRIC, self.collection.get(key))
                    .await?;
                let Some(dictionary) = dictionary else {
                    return Ok(HashSet::new());
                };
                let identifiers: HashMap<String, i32> = dictionary.content_as()?;

                let reads = identifiers
                    .into_keys()
                    .map(|identifier| self.read_item(key, identifier));
                let mut documents = Vec::new();
                let mut evicted = Vec::new();
                for (identifier, document) in try_join_all(reads).await? {
                    match document {
                        Some(document) => documents.push(document),
                        None => evicted.push(identifier),
                    }
                }

                if !evicted.is_empty() {
                    self.remove_evicted(key, &evicted).await;
                }

                documents
                    .iter()
                    .map(Document::content_as::<T>)
                    .collect::<Result<HashSet<T>, StoreError>>()
            })
            .await
    }

    /// Remove `values` from the set at `key`. Members that are not in the set are ignored.
    pub async fn remove<'a, I>(&self, key: &str, values: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let identifiers: BTreeSet<String> = values.into_iter().map(T::identifier).collect();
        let identifiers: Vec<String> = identifiers.into_iter().collect();

        self.metrics
            .measure(SET_REMOVE_METRIC, async {
                for batch in identifiers.chunks(MAX_MUTATE_IN_OPERATIONS) {
                    self.metrics
                        .measure(
                            SET_REMOVE_DICTIONARY_METRIC,
                            self.remove_dictionary_items(key, batch),
                        )
                        .await?;
                    try_join_all(batch.iter().map(|identifier| self.remove_item(key, identifier)))
                        .await?;
                }
                Ok::<_, StoreError>(())
            })
            .await
    }

    async fn write_item(
        &self,
        key: &str,
        value: &T,
        options: UpsertOptions,
    ) -> Result<String, StoreError> {
        let identifier = value.identifier();
        let content = serde_json::to_value(value)?;
        self.metrics
            .measure(
                SET_WRITE_ITEM_METRIC,
                self.collection
                    .upsert_with_options(&member_key(key, &identifier), content, options),
            )
            .await?;
        Ok(identifier)
    }

    async fn insert_keys_to_index(
        &self,
        key: &str,
        identifiers: &[String],
    ) -> Result<(), StoreError> {
        if self.upsert_dictionary_items(key, identifiers).await?.is_some() {
            return Ok(());
        }

        tracing::debug!(key, "dictionary not found, inserting it");
        let dictionary: Map<String, Value> = identifiers
            .iter()
            .map(|identifier| (identifier.clone(), Value::from(PLACEHOLDER)))
            .collect();
        let inserted = self
            .metrics
            .measure(
                SET_WRITE_DICTIONARY_METRIC,
                self.collection.insert(key, Value::Object(dictionary)),
            )
            .await;

        match inserted {
            Ok(_) => Ok(()),
            // Created by a concurrent add since our mutate; mutate it instead.
            Err(err) if err.is_document_exists() => {
                match self.upsert_dictionary_items(key, identifiers).await? {
                    Some(_) => Ok(()),
                    None => Err(StoreError::DocumentNotFound {
                        key: key.to_string(),
                    }),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// `None` if the dictionary does not exist.
    async fn upsert_dictionary_items(
        &self,
        key: &str,
        identifiers: &[String],
    ) -> Result<Option<MutationResult>, StoreError> {
        let specs = identifiers
            .iter()
            .map(|identifier| MutateInSpec::upsert(identifier.clone(), PLACEHOLDER))
            .collect();
        self.metrics
            .measure(SET_MUTATE_DICTIONARY_METRIC, async {
                match self.collection.mutate_in(key, specs).await {
                    Ok(result) => Ok(Some(result)),
                    Err(err) if err.is_not_found() => Ok(None),
                    Err(err) => Err(err),
                }
            })
            .await
    }

    async fn read_item(
        &self,
        key: &str,
        identifier: String,
    ) -> Result<(String, Option<Document>), StoreError> {
        let document = self
            .metrics
            .measure(
                SET_READ_ITEM_METRIC,
                self.collection.get(&member_key(key, &identifier)),
            )
            .await?;
        Ok((identifier, document))
    }

    /// Drop identifiers of evicted members from the dictionary. Failures are logged only.
    async fn remove_evicted(&self, key: &str, evicted: &[String]) {
        tracing::debug!(key, evicted = evicted.len(), "removing evicted members from dictionary");
        let removed = self
            .metrics
            .measure(SET_REMOVE_EVICTED_METRIC, async {
                for batch in evicted.chunks(MAX_MUTATE_IN_OPERATIONS) {
                    self.remove_dictionary_items(key, batch).await?;
                }
                Ok::<_, StoreError>(())
            })
            .await;

        if let Err(err) = removed {
            tracing::warn!(key, error = %err, "failed to remove evicted members from dictionary");
        }
    }

    /// An absent dictionary has nothing left to remove.
    async fn remove_dictionary_items(
        &self,
        key: &str,
        identifiers: &[String],
    ) -> Result<(), StoreError> {
        let specs = identifiers.iter().map(MutateInSpec::remove).collect();
        match self.collection.mutate_in(key, specs).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// An already absent member document counts as removed.
    async fn remove_item(&self, key: &str, identifier: &str) -> Result<(), StoreError> {
        self.metrics
            .measure(SET_REMOVE_ITEM_METRIC, async {
                match self.collection.remove(&member_key(key, identifier)).await {
                    Ok(_) => Ok(()),
                    Err(err) if err.is_not_found() => Ok(()),
                    Err(err) => Err(err),
                }
            })
            .await
    }
}
