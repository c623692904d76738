//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 指标收集集成测试

use crate::common::{fixture, generate_unique_service_name};
use oxstrat::config::WriteBehindConfig;
use oxstrat::metrics::{get_metrics_string, GLOBAL_METRICS};
use oxstrat::{CacheAsideStrategy, CacheStrategy, Entry, EntryId, WriteBehindStrategy};
use serial_test::serial;

#[path = "../common/mod.rs"]
mod common;

#[test]
#[serial]
fn test_metrics_recording() {
    GLOBAL_METRICS.record_request("test_service", "cache", "get", "hit");
    GLOBAL_METRICS.record_duration("test_service", "strategy", "get", 0.005);
    GLOBAL_METRICS.set_write_queue_depth("test_service", 42);

    let output = get_metrics_string();

    assert!(output.contains("strategy_requests_total{labels=\"test_service:cache:get:hit\"}"));
    assert!(output.contains("strategy_operation_duration_seconds_count{service=\"test_service\", layer=\"strategy\", operation=\"get\"}"));
    assert!(output.contains("strategy_write_queue_depth{service=\"test_service\"} 42"));
}

/// 服务名包含冒号时耗时指标仍然完整输出
#[test]
#[serial]
fn test_duration_lines_keep_services_with_colons() {
    GLOBAL_METRICS.record_duration("tenant:a", "strategy", "update", 0.002);

    let output = get_metrics_string();
    assert!(output.contains("strategy_operation_duration_seconds_sum{service=\"tenant:a\", layer=\"strategy\", operation=\"update\"}"));
    assert!(output.contains("strategy_operation_duration_seconds_count{service=\"tenant:a\", layer=\"strategy\", operation=\"update\"} 1"));
}

/// 策略读取按命中/未命中记录指标
#[tokio::test]
#[serial]
async fn test_strategy_records_hits_and_misses() {
    let (cache, store) = fixture(0);
    let name = generate_unique_service_name("metrics_aside");
    let service = CacheAsideStrategy::new(name.clone(), cache, store.clone());
    store.seed(vec![Entry::new(1, "A", "")]).await;

    service.get(EntryId(1)).await.unwrap();
    service.get(EntryId(1)).await.unwrap();
    service.get(EntryId(2)).await.unwrap();

    assert_eq!(GLOBAL_METRICS.request_count(&name, "cache", "get", "hit"), 1);
    assert_eq!(GLOBAL_METRICS.request_count(&name, "cache", "get", "miss"), 2);
    assert_eq!(GLOBAL_METRICS.request_count(&name, "store", "find", "found"), 1);
    assert_eq!(GLOBAL_METRICS.request_count(&name, "store", "find", "absent"), 1);
}

/// 写后队列排空后深度归零
#[tokio::test]
#[serial]
async fn test_write_behind_queue_metrics() {
    let (cache, store) = fixture(1);
    let name = generate_unique_service_name("metrics_behind");
    let service =
        WriteBehindStrategy::new(name.clone(), cache, store, WriteBehindConfig::default())
            .unwrap();

    for i in 1..=4u64 {
        service.update(Entry::new(i, "x", "")).await.unwrap();
    }
    service.shutdown().await.unwrap();

    assert_eq!(GLOBAL_METRICS.request_count(&name, "queue", "enqueue", "success"), 4);
    assert_eq!(GLOBAL_METRICS.request_count(&name, "queue", "flush", "success"), 4);
    assert_eq!(
        GLOBAL_METRICS.write_queue_depth.get(&name).map(|v| *v),
        Some(0)
    );
}
