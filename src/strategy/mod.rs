//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存一致性策略的接口和实现。
//!
//! - [`CacheAsideStrategy`]：读未命中时回源并填充缓存，写入只落存储
//! - [`WriteThroughStrategy`]：写入先落存储再写缓存，均在返回前完成
//! - [`WriteBehindStrategy`]：写入立即更新缓存，存储写入交给单工作者队列异步完成

pub mod cache_aside;
pub mod write_behind;
pub mod write_through;

use crate::backend::{CacheBackend, StoreBackend};
use crate::config::Config;
use crate::entry::{Entry, EntryId};
use crate::error::{Result, StrategyError};
use crate::metrics::GLOBAL_METRICS;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

pub use cache_aside::CacheAsideStrategy;
pub use write_behind::{DeadLetter, WriteBehindStrategy};
pub use write_through::WriteThroughStrategy;

/// 策略类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[value(name = "cache_aside")]
    CacheAside,
    #[value(name = "write_through")]
    WriteThrough,
    #[value(name = "write_behind")]
    WriteBehind,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::CacheAside,
        StrategyKind::WriteThrough,
        StrategyKind::WriteBehind,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CacheAside => "cache_aside",
            StrategyKind::WriteThrough => "write_through",
            StrategyKind::WriteBehind => "write_behind",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| StrategyError::ConfigError(format!("unknown strategy '{}'", s)))
    }
}

/// 缓存策略特征
///
/// 调用方只通过 `get`/`update` 访问数据，由策略决定缓存和存储的编排方式
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    /// 策略类型
    fn kind(&self) -> StrategyKind;

    /// 策略实例名称，用于日志和指标
    fn service_name(&self) -> &str;

    /// 读取条目，不存在时返回 `None`
    async fn get(&self, id: EntryId) -> Result<Option<Entry>>;

    /// 写入条目
    async fn update(&self, entry: Entry) -> Result<()>;

    /// 关闭策略。同步策略没有需要释放的资源
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// 根据类型构建策略
///
/// 写后策略会启动后台写入任务，因此必须在 tokio 运行时内调用
pub fn build_strategy(
    kind: StrategyKind,
    service_name: impl Into<String>,
    cache: Arc<dyn CacheBackend>,
    store: Arc<dyn StoreBackend>,
    config: &Config,
) -> Result<Arc<dyn CacheStrategy>> {
    let service_name = service_name.into();
    let strategy: Arc<dyn CacheStrategy> = match kind {
        StrategyKind::CacheAside => Arc::new(CacheAsideStrategy::new(service_name, cache, store)),
        StrategyKind::WriteThrough => {
            Arc::new(WriteThroughStrategy::new(service_name, cache, store))
        }
        StrategyKind::WriteBehind => Arc::new(WriteBehindStrategy::new(
            service_name,
            cache,
            store,
            config.write_behind.clone(),
        )?),
    };
    Ok(strategy)
}

/// 缓存未命中时对回源结果的处理方式
pub(crate) enum MissFill<'a> {
    /// 不回填缓存
    Skip,
    /// 回源后直接回填
    Populate,
    /// 持有写锁完成回源和回填，与同一实例的写入互斥
    Serialized(&'a Mutex<()>),
}

/// 缓存优先的读取路径
///
/// 命中直接返回；未命中时回源存储，存储中存在时按 `fill` 决定是否写回缓存
pub(crate) async fn read_cache_first(
    service_name: &str,
    cache: &dyn CacheBackend,
    store: &dyn StoreBackend,
    id: EntryId,
    fill: MissFill<'_>,
) -> Result<Option<Entry>> {
    let start = Instant::now();

    if let Some(entry) = cache.get(id).await? {
        GLOBAL_METRICS.record_request(service_name, "cache", "get", "hit");
        GLOBAL_METRICS.record_duration(
            service_name,
            "strategy",
            "get",
            start.elapsed().as_secs_f64(),
        );
        debug!("get id={}: cache hit", id);
        return Ok(Some(entry));
    }
    GLOBAL_METRICS.record_request(service_name, "cache", "get", "miss");

    // 读取与回填之间不能插入写入，否则旧值会覆盖写入刚放进缓存的新值
    let _guard = match &fill {
        MissFill::Serialized(lock) => Some(lock.lock().await),
        _ => None,
    };
    let populate = !matches!(fill, MissFill::Skip);

    let loaded = store.find_by_id(id).await?;
    let result = if loaded.is_some() { "found" } else { "absent" };
    GLOBAL_METRICS.record_request(service_name, "store", "find", result);

    if populate {
        if let Some(entry) = &loaded {
            cache.put(id, entry.clone()).await?;
            GLOBAL_METRICS.record_request(service_name, "cache", "put", "success");
        }
    }

    GLOBAL_METRICS.record_duration(
        service_name,
        "strategy",
        "get",
        start.elapsed().as_secs_f64(),
    );
    debug!(
        "get id={}: cache miss, store {}, populate={}",
        id, result, populate
    );
    Ok(loaded)
}
