//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 直写策略集成测试

use crate::common::mock_store::{FailingStore, SlowReadStore};
use crate::common::{fixture, setup_logging};
use oxstrat::{
    CacheBackend, CacheStrategy, Entry, EntryId, MemoryCache, StoreBackend, StrategyError,
    WriteThroughStrategy,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[path = "../common/mod.rs"]
mod common;

#[tokio::test]
async fn test_write_through_keeps_cache_and_store_in_sync() {
    let (cache, store) = fixture(10);
    let service = WriteThroughStrategy::new("write_through", cache.clone(), store.clone());

    service
        .update(Entry::new(1, "Test Post", "Content"))
        .await
        .unwrap();

    let cached = service.get(EntryId(1)).await.unwrap().unwrap();
    assert_eq!(cached.title(), "Test Post");
    assert_eq!(cache.hits().await, 1);
    assert_eq!(cache.misses().await, 0);
    assert_eq!(store.read_count().await, 0);

    let stored = store.find_by_id(EntryId(1)).await.unwrap().unwrap();
    assert!(stored.same_content(&cached));
    assert_eq!(store.write_count().await, 1);
}

/// 覆盖已缓存的值后立即读取，命中并返回新值
#[tokio::test]
async fn test_write_through_replaces_cached_value() {
    let (cache, store) = fixture(5);
    let service = WriteThroughStrategy::new("write_through", cache.clone(), store.clone());

    store.save(Entry::new(1, "A", "")).await.unwrap();
    service.get(EntryId(1)).await.unwrap();
    let reads_before = store.read_count().await;

    service.update(Entry::new(1, "B", "")).await.unwrap();
    let got = service.get(EntryId(1)).await.unwrap().unwrap();

    assert_eq!(got.title(), "B");
    assert_eq!(cache.hits().await, 1);
    assert_eq!(store.read_count().await, reads_before);
    assert_eq!(store.peek(EntryId(1)).await.unwrap().title(), "B");
}

#[tokio::test]
async fn test_write_through_waits_for_store() {
    let (cache, store) = fixture(10);
    let service = WriteThroughStrategy::new("write_through", cache, store);

    let start = Instant::now();
    service
        .update(Entry::new(1, "Test Post", "Content"))
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_millis(10));
}

/// 存储失败时错误返回给调用方，缓存不被修改
#[tokio::test]
async fn test_write_through_store_failure_leaves_cache_untouched() {
    setup_logging();
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(FailingStore::new(Duration::ZERO, [2]));
    let service = WriteThroughStrategy::new("write_through", cache.clone(), store.clone());

    service.update(Entry::new(1, "ok", "")).await.unwrap();
    let result = service.update(Entry::new(2, "doomed", "")).await;

    assert!(matches!(result, Err(StrategyError::StoreError(_))));
    assert!(cache.peek(EntryId(2)).await.is_none());
    assert!(store.peek(EntryId(2)).await.is_none());
    assert_eq!(cache.peek(EntryId(1)).await.unwrap().title(), "ok");
}

/// 并发写入同一条目后，缓存与存储持有相同的最终值
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_through_concurrent_updates_converge() {
    let (cache, store) = fixture(2);
    let service = Arc::new(WriteThroughStrategy::new(
        "write_through",
        cache.clone(),
        store.clone(),
    ));

    let mut handles = Vec::new();
    for v in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .update(Entry::new(7, format!("v{}", v), ""))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let cached = cache.peek(EntryId(7)).await.unwrap();
    let stored = store.peek(EntryId(7)).await.unwrap();
    assert!(cached.same_content(&stored));
    assert_eq!(store.write_count().await, 16);
}

#[tokio::test]
async fn test_write_through_get_populates_on_miss() {
    let (cache, store) = fixture(1);
    let service = WriteThroughStrategy::new("write_through", cache.clone(), store.clone());
    store.seed(vec![Entry::new(3, "seeded", "")]).await;

    service.get(EntryId(3)).await.unwrap();
    assert_eq!(cache.peek(EntryId(3)).await.unwrap().title(), "seeded");
    assert!(service.get(EntryId(4)).await.unwrap().is_none());
    assert!(cache.peek(EntryId(4)).await.is_none());
    assert_eq!(cache.stats().await.misses, 2);
}

/// 回源读取与并发写入交错时，回填不会用旧值覆盖新值
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_through_read_fill_does_not_overwrite_concurrent_update() {
    setup_logging();
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(SlowReadStore::new(Duration::from_millis(50)));
    store.seed(vec![Entry::new(1, "V1", "")]).await;
    let service = Arc::new(WriteThroughStrategy::new(
        "write_through",
        cache.clone(),
        store.clone(),
    ));

    let reader = {
        let service = service.clone();
        tokio::spawn(async move { service.get(EntryId(1)).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    service.update(Entry::new(1, "V2", "")).await.unwrap();
    reader.await.unwrap().unwrap();

    let got = service.get(EntryId(1)).await.unwrap().unwrap();
    assert_eq!(got.title(), "V2");
    let cached = cache.peek(EntryId(1)).await.unwrap();
    let stored = store.peek(EntryId(1)).await.unwrap();
    assert!(cached.same_content(&stored));
}

#[tokio::test]
async fn test_write_through_rejects_unassigned_id() {
    let (cache, store) = fixture(0);
    let service = WriteThroughStrategy::new("write_through", cache.clone(), store.clone());

    let result = service
        .update(Entry::new(EntryId::UNASSIGNED, "bad", ""))
        .await;
    assert!(matches!(result, Err(StrategyError::InvalidEntry(_))));
    assert!(cache.is_empty().await);
    assert_eq!(store.write_count().await, 0);
}
