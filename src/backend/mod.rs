//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存策略依赖的两个协作者：内存缓存和慢速持久存储。

pub mod memory;
pub mod store;

use crate::entry::{Entry, EntryId};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

pub use memory::MemoryCache;
pub use store::SimulatedStore;

/// 缓存计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
}

/// 存储计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub read_count: u64,
    pub write_count: u64,
    pub len: usize,
}

/// 缓存后端trait
///
/// 实现必须是内部同步的，允许多个调用方并发访问。
/// 未命中以 `Ok(None)` 表示。
#[async_trait]
pub trait CacheBackend: Send + Sync + std::fmt::Debug {
    /// 获取条目，命中或未命中各自累加一次计数
    async fn get(&self, id: EntryId) -> Result<Option<Entry>>;

    /// 无条件覆盖 `id` 的关联
    async fn put(&self, id: EntryId, entry: Entry) -> Result<()>;

    /// 移除单个关联，不影响计数
    async fn invalidate(&self, id: EntryId) -> Result<()>;

    /// 清空映射并重置计数（原子地）
    async fn clear(&self) -> Result<()>;

    /// 获取计数快照
    async fn stats(&self) -> CacheStats;
}

/// 持久存储后端trait
///
/// 每次 `find_by_id` 和 `save` 都被计数，无论结果如何。
#[async_trait]
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// 根据标识符查找条目
    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>>;

    /// 按 `entry.id()` 插入或更新
    async fn save(&self, entry: Entry) -> Result<()>;

    /// 清空映射并重置计数
    async fn clear(&self) -> Result<()>;

    /// 获取计数快照
    async fn stats(&self) -> StoreStats;
}
