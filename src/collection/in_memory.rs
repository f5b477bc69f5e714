//! InMemoryCollection - HashMap-backed document store for testing and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{
    Collection, Document, MutateInSpec, MutationResult, UpsertOptions, MAX_MUTATE_IN_OPERATIONS,
};
use crate::error::StoreError;
use crate::key::MAX_KEY_LENGTH;

/// Internal stored representation of a document.
struct StoredDocument {
    content: Value,
    cas: u64,
    expires_at: Option<Instant>,
}

impl StoredDocument {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory document store.
///
/// Behaves like the raw store: keys longer than [`MAX_KEY_LENGTH`] bytes are rejected,
/// `mutate_in` accepts at most [`MAX_MUTATE_IN_OPERATIONS`] specs, and expired documents
/// are hidden from every read and purged by the next `get`, `upsert`, `insert` or `remove` of
/// their key. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryCollection {
    storage: Arc<RwLock<HashMap<String, StoredDocument>>>,
    cas_seq: Arc<AtomicU64>,
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollection {
    pub fn new() -> Self {
        InMemoryCollection {
            storage: Arc::new(RwLock::new(HashMap::new())),
            cas_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Whether a live document is stored under the physical `key`.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.storage
            .read()
            .map(|storage| storage.get(key).is_some_and(|doc| !doc.is_expired(now)))
            .unwrap_or(false)
    }

    /// Physical keys of all live documents.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.storage
            .read()
            .map(|storage| {
                storage
                    .iter()
                    .filter(|(_, doc)| !doc.is_expired(now))
                    .map(|(key, _)| key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_cas(&self) -> u64 {
        self.cas_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn check_key(key: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidArgument("key must not be empty".into()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(StoreError::InvalidArgument(format!(
                "key of {} bytes exceeds the {} byte limit",
                key.len(),
                MAX_KEY_LENGTH
            )));
        }
        Ok(())
    }

    fn store(
        &self,
        storage: &mut HashMap<String, StoredDocument>,
        key: &str,
        content: Value,
        expires_at: Option<Instant>,
    ) -> MutationResult {
        let cas = self.next_cas();
        storage.insert(
            key.to_string(),
            StoredDocument {
                content,
                cas,
                expires_at,
            },
        );
        MutationResult { cas }
    }
}

fn apply_spec(object: &mut Map<String, Value>, spec: MutateInSpec) {
    match spec {
        MutateInSpec::Upsert { path, value } => {
            object.insert(path, value);
        }
        MutateInSpec::Remove { path } => {
            object.remove(&path);
        }
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    async fn get(&self, key: &str) -> Result<Option<Document>, StoreError> {
        Self::check_key(key)?;
        let now = Instant::now();
        {
            let storage = self
                .storage
                .read()
                .map_err(|_| StoreError::LockPoisoned("get"))?;

            match storage.get(key) {
                None => return Ok(None),
                Some(doc) if !doc.is_expired(now) => {
                    return Ok(Some(Document {
                        key: key.to_string(),
                        content: doc.content.clone(),
                        cas: doc.cas,
                        expiry: doc.expires_at,
                    }))
                }
                Some(_) => {}
            }
        }

        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("get"))?;
        // Re-checked under the write lock: a concurrent write may have replaced it.
        if storage.get(key).is_some_and(|doc| doc.is_expired(now)) {
            storage.remove(key);
        }
        Ok(None)
    }

    async fn upsert_with_options(
        &self,
        key: &str,
        value: Value,
        options: UpsertOptions,
    ) -> Result<MutationResult, StoreError> {
        Self::check_key(key)?;
        let expires_at = options.expiry.map(|ttl| Instant::now() + ttl);
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("upsert"))?;

        Ok(self.store(&mut storage, key, value, expires_at))
    }

    async fn mutate_in(
        &self,
        key: &str,
        specs: Vec<MutateInSpec>,
    ) -> Result<MutationResult, StoreError> {
        Self::check_key(key)?;
        if specs.is_empty() || specs.len() > MAX_MUTATE_IN_OPERATIONS {
            return Err(StoreError::InvalidArgument(format!(
                "mutate_in takes between 1 and {} specs, got {}",
                MAX_MUTATE_IN_OPERATIONS,
                specs.len()
            )));
        }

        let now = Instant::now();
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("mutate_in"))?;

        let (mut object, expires_at) = match storage.get(key).filter(|doc| !doc.is_expired(now)) {
            Some(StoredDocument {
                content: Value::Object(object),
                expires_at,
                ..
            }) => (object.clone(), *expires_at),
            Some(_) => {
                return Err(StoreError::InvalidArgument(format!(
                    "document {} is not a JSON object",
                    key
                )))
            }
            None => {
                return Err(StoreError::DocumentNotFound {
                    key: key.to_string(),
                })
            }
        };

        // All specs apply to a copy, so a request is all or nothing.
        for spec in specs {
            apply_spec(&mut object, spec);
        }

        Ok(self.store(&mut storage, key, Value::Object(object), expires_at))
    }

    async fn insert(&self, key: &str, value: Value) -> Result<MutationResult, StoreError> {
        Self::check_key(key)?;
        let now = Instant::now();
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert"))?;

        if storage.get(key).is_some_and(|doc| !doc.is_expired(now)) {
            return Err(StoreError::DocumentExists {
                key: key.to_string(),
            });
        }

        Ok(self.store(&mut storage, key, value, None))
    }

    async fn remove(&self, key: &str) -> Result<MutationResult, StoreError> {
        Self::check_key(key)?;
        let now = Instant::now();
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("remove"))?;

        match storage.remove(key) {
            Some(doc) if !doc.is_expired(now) => Ok(MutationResult {
                cas: self.next_cas(),
            }),
            _ => Err(StoreError::DocumentNotFound {
                key: key.to_string(),
            }),
        }
    }
}
