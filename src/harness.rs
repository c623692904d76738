//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 策略对比工具：用相同的输入驱动多个策略，暴露它们在一致性和延迟上的差异。

use crate::backend::{CacheBackend, MemoryCache, SimulatedStore, StoreBackend};
use crate::config::Config;
use crate::entry::{Entry, EntryId};
use crate::error::Result;
use crate::strategy::{build_strategy, StrategyKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// 负载中的单个操作
#[derive(Debug, Clone)]
pub enum Operation {
    Get(EntryId),
    Update(Entry),
}

/// 负载
///
/// `seed` 在运行前直接写入存储，不计入存储计数
#[derive(Debug, Clone, Default)]
pub struct Workload {
    pub seed: Vec<Entry>,
    pub ops: Vec<Operation>,
}

impl Workload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, entries: impl IntoIterator<Item = Entry>) -> Self {
        self.seed.extend(entries);
        self
    }

    pub fn get(mut self, id: impl Into<EntryId>) -> Self {
        self.ops.push(Operation::Get(id.into()));
        self
    }

    pub fn update(mut self, entry: Entry) -> Self {
        self.ops.push(Operation::Update(entry));
        self
    }

    /// 标准负载
    ///
    /// 预置 `n` 个条目，读两遍（冷读、热读），逐个更新，再读一遍
    pub fn standard(n: usize) -> Self {
        let ids: Vec<u64> = (1..=n as u64).collect();
        let mut workload = Self::new().with_seed(
            ids.iter()
                .map(|&i| Entry::new(i, format!("post-{}", i), "v1")),
        );
        for _ in 0..2 {
            for &i in &ids {
                workload = workload.get(i);
            }
        }
        for &i in &ids {
            workload = workload.update(Entry::new(i, format!("post-{}", i), "v2"));
        }
        for &i in &ids {
            workload = workload.get(i);
        }
        workload
    }
}

/// 单个策略的运行报告
#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub strategy: StrategyKind,
    pub gets: usize,
    pub updates: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub store_reads: u64,
    /// 排空后的存储写入次数
    pub store_writes: u64,
    /// 返回内容与最近一次写入不一致的读取
    pub stale_reads: usize,
    pub total_get_ms: f64,
    pub total_update_ms: f64,
    /// 排空后存储是否持有每个条目的最新值
    pub store_consistent: bool,
    /// 排空后缓存内容与存储不一致的条目数
    pub cache_divergent: usize,
}

impl StrategyReport {
    pub fn mean_get_ms(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.total_get_ms / self.gets as f64
        }
    }

    pub fn mean_update_ms(&self) -> f64 {
        if self.updates == 0 {
            0.0
        } else {
            self.total_update_ms / self.updates as f64
        }
    }
}

/// 多个策略的对比结果
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub reports: Vec<StrategyReport>,
}

impl Comparison {
    pub fn report(&self, kind: StrategyKind) -> Option<&StrategyReport> {
        self.reports.iter().find(|r| r.strategy == kind)
    }

    /// 渲染为文本表格
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<14} {:>6} {:>7} {:>6} {:>7} {:>6} {:>7} {:>6} {:>11} {:>12} {:>10} {:>9}",
            "strategy",
            "gets",
            "updates",
            "hits",
            "misses",
            "reads",
            "writes",
            "stale",
            "get ms/op",
            "update ms/op",
            "consistent",
            "divergent"
        );
        for r in &self.reports {
            let _ = writeln!(
                out,
                "{:<14} {:>6} {:>7} {:>6} {:>7} {:>6} {:>7} {:>6} {:>11.2} {:>12.2} {:>10} {:>9}",
                r.strategy.as_str(),
                r.gets,
                r.updates,
                r.cache_hits,
                r.cache_misses,
                r.store_reads,
                r.store_writes,
                r.stale_reads,
                r.mean_get_ms(),
                r.mean_update_ms(),
                r.store_consistent,
                r.cache_divergent
            );
        }
        out
    }
}

/// 策略对比工具
///
/// 每次运行都创建全新的缓存和存储，保证各策略面对相同的初始状态
pub struct StrategyHarness {
    config: Config,
    label: String,
}

impl StrategyHarness {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            label: "harness".to_string(),
        }
    }

    /// 设置运行标签，策略实例名为 `{kind}_{label}`，用于区分指标
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// 某个策略在本工具中的实例名称
    pub fn service_name(&self, kind: StrategyKind) -> String {
        format!("{}_{}", kind, self.label)
    }

    /// 用负载驱动单个策略
    #[instrument(skip(self, workload), level = "info", fields(ops = workload.ops.len()))]
    pub async fn run(&self, kind: StrategyKind, workload: &Workload) -> Result<StrategyReport> {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(SimulatedStore::from_config(&self.config.store));
        store.seed(workload.seed.iter().cloned()).await;

        let strategy = build_strategy(
            kind,
            self.service_name(kind),
            cache.clone(),
            store.clone(),
            &self.config,
        )?;

        let mut latest: BTreeMap<EntryId, Entry> =
            workload.seed.iter().map(|e| (e.id(), e.clone())).collect();

        let mut gets = 0;
        let mut updates = 0;
        let mut stale_reads = 0;
        let mut total_get_ms = 0.0;
        let mut total_update_ms = 0.0;

        // 操作失败时也要先关闭策略，让写后队列排空后再返回错误
        let driven: Result<()> = async {
            for op in &workload.ops {
                match op {
                    Operation::Get(id) => {
                        let start = Instant::now();
                        let found = strategy.get(*id).await?;
                        total_get_ms += start.elapsed().as_secs_f64() * 1000.0;
                        gets += 1;

                        let fresh = match (found.as_ref(), latest.get(id)) {
                            (Some(got), Some(want)) => got.same_content(want),
                            (None, None) => true,
                            _ => false,
                        };
                        if !fresh {
                            stale_reads += 1;
                        }
                    }
                    Operation::Update(entry) => {
                        let start = Instant::now();
                        strategy.update(entry.clone()).await?;
                        total_update_ms += start.elapsed().as_secs_f64() * 1000.0;
                        updates += 1;
                        latest.insert(entry.id(), entry.clone());
                    }
                }
            }
            Ok(())
        }
        .await;

        let cache_stats = cache.stats().await;
        let shutdown = strategy.shutdown().await;
        driven?;
        shutdown?;
        let store_stats = store.stats().await;

        let mut store_consistent = true;
        let mut cache_divergent = 0;
        for (id, want) in &latest {
            let stored = store.peek(*id).await;
            if !stored.as_ref().is_some_and(|s| s.same_content(want)) {
                store_consistent = false;
            }
            if let Some(cached) = cache.peek(*id).await {
                if !stored.as_ref().is_some_and(|s| s.same_content(&cached)) {
                    cache_divergent += 1;
                }
            }
        }

        let report = StrategyReport {
            strategy: kind,
            gets,
            updates,
            cache_hits: cache_stats.hits,
            cache_misses: cache_stats.misses,
            store_reads: store_stats.read_count,
            store_writes: store_stats.write_count,
            stale_reads,
            total_get_ms,
            total_update_ms,
            store_consistent,
            cache_divergent,
        };
        info!(
            "{}: hits={}, misses={}, reads={}, writes={}, stale={}, consistent={}",
            kind,
            report.cache_hits,
            report.cache_misses,
            report.store_reads,
            report.store_writes,
            report.stale_reads,
            report.store_consistent
        );
        Ok(report)
    }

    /// 用同一负载依次驱动配置中的全部策略
    pub async fn compare(&self, workload: &Workload) -> Result<Comparison> {
        let mut reports = Vec::with_capacity(self.config.harness.strategies.len());
        for kind in &self.config.harness.strategies {
            reports.push(self.run(*kind, workload).await?);
        }
        Ok(Comparison { reports })
    }
}
