//! Typed document repository against a prefixed, length-limited collection.

mod support;

use std::sync::Arc;

use docset::key::sha256_hex;
use docset::{
    Collection, CollectionExt, DocumentRepository, InMemoryCollection, InMemoryMetrics, Metrics,
    StoreError, TypedRepository,
};
use support::{Dto, FailingCollection, Operation};

const PREFIX: &str = "prefix";

fn collection(raw: &InMemoryCollection) -> impl Collection {
    raw.clone().hashing_long_keys().with_prefix(PREFIX)
}

#[tokio::test]
async fn saves_object_in_cache() {
    let raw = InMemoryCollection::new();
    let repository = TypedRepository::<Dto, _>::new(collection(&raw), Metrics::noop());
    let dto = Dto::new("key", "body");

    repository.put(&dto.id, &dto).await.unwrap();
    let actual = repository.get(&dto.id).await.unwrap();

    assert_eq!(actual.unwrap().value, dto.value);
    assert!(raw.contains("prefix_key"));
}

#[tokio::test]
async fn saves_object_under_hashed_key_when_key_is_longer_than_limit() {
    let raw = InMemoryCollection::new();
    let repository = TypedRepository::<Dto, _>::new(collection(&raw), Metrics::noop());
    let dto = Dto::new(&"id".repeat(250), "body");

    repository.put(&dto.id, &dto).await.unwrap();
    let actual = repository.get(&dto.id).await.unwrap();

    assert_eq!(actual.unwrap().value, dto.value);
    let prefixed = format!("prefix_{}", dto.id);
    assert!(matches!(
        raw.get(&prefixed).await,
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(raw.contains(&sha256_hex(&prefixed)));
}

#[tokio::test]
async fn get_of_absent_key_is_empty() {
    let raw = InMemoryCollection::new();
    let repository = TypedRepository::<Dto, _>::new(collection(&raw), Metrics::noop());

    assert_eq!(repository.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn put_overwrites_previous_value() {
    let raw = InMemoryCollection::new();
    let repository = TypedRepository::<Dto, _>::new(collection(&raw), Metrics::noop());

    repository.put("key", &Dto::new("key", "v1")).await.unwrap();
    repository.put("key", &Dto::new("key", "v2")).await.unwrap();

    assert_eq!(
        repository.get("key").await.unwrap(),
        Some(Dto::new("key", "v2"))
    );
}

#[tokio::test]
async fn measures_cache_read_and_write() {
    let registry = Arc::new(InMemoryMetrics::new());
    let raw = InMemoryCollection::new();
    let repository = TypedRepository::<Dto, _>::new(
        collection(&raw),
        Metrics::new(registry.clone(), "cache.couchbase"),
    );
    let dto = Dto::new("key", "body");

    repository.put(&dto.id, &dto).await.unwrap();
    repository.get(&dto.id).await.unwrap();

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.timer_count("cache.couchbase.key.write"), 1);
    assert_eq!(snapshot.timer_count("cache.couchbase.key.read"), 1);
}

#[tokio::test]
async fn measures_cache_errors() {
    let registry = Arc::new(InMemoryMetrics::new());
    let failing = FailingCollection::default();
    failing.fail(Operation::Get);
    failing.fail(Operation::Upsert);
    let repository = TypedRepository::<Dto, _>::new(
        failing.with_prefix(PREFIX),
        Metrics::new(registry.clone(), "cache.couchbase"),
    );

    let write = repository.put("id", &Dto::new("key", "body")).await;
    let read = repository.get("id").await;

    assert_eq!(write, Err(StoreError::Backend("timeout?".into())));
    assert!(matches!(read, Err(StoreError::PrefixedGet { .. })));
    let snapshot = registry.snapshot();
    assert_eq!(snapshot.counter("cache.couchbase.key.write_error"), 1);
    assert_eq!(snapshot.counter("cache.couchbase.key.read_error"), 1);
    assert_eq!(snapshot.timer_count("cache.couchbase.key.write"), 0);
    assert_eq!(snapshot.timer_count("cache.couchbase.key.read"), 0);
}

#[tokio::test]
async fn facade_and_repository_metrics_compose() {
    let registry = Arc::new(InMemoryMetrics::new());
    let metrics = Metrics::new(registry.clone(), "cache");
    let raw = InMemoryCollection::new();
    let repository = TypedRepository::<Dto, _>::new(
        collection(&raw).metered(metrics.clone()),
        metrics,
    );

    repository.put("key", &Dto::new("key", "body")).await.unwrap();
    repository.get("key").await.unwrap();

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.timer_count("cache.store.upsert"), 1);
    assert_eq!(snapshot.timer_count("cache.store.get"), 1);
    assert_eq!(snapshot.timer_count("cache.key.write"), 1);
    assert_eq!(snapshot.timer_count("cache.key.read"), 1);
}
