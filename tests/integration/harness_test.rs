//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 策略对比集成测试

use crate::common::{generate_unique_service_name, setup_logging};
use oxstrat::config::Config;
use oxstrat::metrics::GLOBAL_METRICS;
use oxstrat::{Entry, EntryId, StrategyError, StrategyHarness, StrategyKind, Workload};

#[path = "../common/mod.rs"]
mod common;

fn fast_config() -> Config {
    let mut config = Config::default();
    config.store.latency_ms = 1;
    config
}

/// 标准负载下三种策略的一致性画像
#[tokio::test]
async fn test_compare_standard_workload_profiles() {
    setup_logging();
    let harness = StrategyHarness::new(fast_config());
    let comparison = harness.compare(&Workload::standard(3)).await.unwrap();
    assert_eq!(comparison.reports.len(), 3);

    let aside = comparison.report(StrategyKind::CacheAside).unwrap();
    assert_eq!(aside.gets, 9);
    assert_eq!(aside.updates, 3);
    assert_eq!(aside.cache_misses, 3);
    assert_eq!(aside.cache_hits, 6);
    assert_eq!(aside.store_reads, 3);
    assert_eq!(aside.store_writes, 3);
    assert_eq!(aside.stale_reads, 3);
    assert!(aside.store_consistent);
    assert_eq!(aside.cache_divergent, 3);

    let through = comparison.report(StrategyKind::WriteThrough).unwrap();
    assert_eq!(through.cache_misses, 3);
    assert_eq!(through.cache_hits, 6);
    assert_eq!(through.store_reads, 3);
    assert_eq!(through.store_writes, 3);
    assert_eq!(through.stale_reads, 0);
    assert!(through.store_consistent);
    assert_eq!(through.cache_divergent, 0);

    let behind = comparison.report(StrategyKind::WriteBehind).unwrap();
    assert_eq!(behind.cache_misses, 6);
    assert_eq!(behind.cache_hits, 3);
    assert_eq!(behind.store_reads, 6);
    assert_eq!(behind.store_writes, 3);
    assert_eq!(behind.stale_reads, 0);
    assert!(behind.store_consistent);
    assert_eq!(behind.cache_divergent, 0);
}

/// 写后策略的写入延迟明显低于直写
#[tokio::test]
async fn test_write_behind_updates_are_cheaper_than_write_through() {
    let mut config = Config::default();
    config.store.latency_ms = 20;
    let harness = StrategyHarness::new(config);

    let workload = Workload::new()
        .update(Entry::new(1, "a", ""))
        .update(Entry::new(2, "b", ""))
        .update(Entry::new(3, "c", ""));

    let through = harness
        .run(StrategyKind::WriteThrough, &workload)
        .await
        .unwrap();
    let behind = harness
        .run(StrategyKind::WriteBehind, &workload)
        .await
        .unwrap();

    assert!(through.mean_update_ms() >= 20.0);
    assert!(behind.mean_update_ms() < through.mean_update_ms());
    assert!(behind.store_consistent);
    assert_eq!(behind.store_writes, 3);
}

#[tokio::test]
async fn test_compare_respects_configured_strategies() {
    let mut config = fast_config();
    config.harness.strategies = vec![StrategyKind::WriteBehind];
    let harness = StrategyHarness::new(config);

    let comparison = harness.compare(&Workload::standard(1)).await.unwrap();
    assert_eq!(comparison.reports.len(), 1);
    assert!(comparison.report(StrategyKind::CacheAside).is_none());

    let table = comparison.render_table();
    assert!(table.contains("write_behind"));

    let json = serde_json::to_value(&comparison).unwrap();
    assert_eq!(json["reports"][0]["strategy"], "write_behind");
}

#[tokio::test]
async fn test_reads_of_missing_ids_are_not_stale() {
    let harness = StrategyHarness::new(fast_config());
    let workload = Workload::new().get(42u64).get(42u64);

    let report = harness
        .run(StrategyKind::CacheAside, &workload)
        .await
        .unwrap();
    assert_eq!(report.stale_reads, 0);
    assert_eq!(report.cache_misses, 2);
    assert_eq!(report.store_reads, 2);
}

/// 操作失败时，返回错误之前写后队列已经排空
#[tokio::test]
async fn test_failed_run_still_drains_write_behind_queue() {
    setup_logging();
    let mut config = Config::default();
    config.store.latency_ms = 30;
    let harness =
        StrategyHarness::new(config).with_label(generate_unique_service_name("failing_run"));

    let workload = Workload::new()
        .update(Entry::new(1, "accepted", ""))
        .update(Entry::new(EntryId::UNASSIGNED, "rejected", ""));

    let result = harness.run(StrategyKind::WriteBehind, &workload).await;
    assert!(matches!(result, Err(StrategyError::InvalidEntry(_))));

    let service = harness.service_name(StrategyKind::WriteBehind);
    assert_eq!(
        GLOBAL_METRICS.request_count(&service, "queue", "flush", "success"),
        1
    );
}
