//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于内存的缓存后端，并记录命中与未命中次数。

use super::{CacheBackend, CacheStats};
use crate::entry::{Entry, EntryId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// 缓存内部状态
///
/// 映射和计数受同一把锁保护，保证 `clear` 对外是一次状态转换
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<EntryId, Entry>,
    hits: u64,
    misses: u64,
}

/// 内存缓存后端
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: Mutex<CacheState>,
}

impl MemoryCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 命中次数
    pub async fn hits(&self) -> u64 {
        self.state.lock().await.hits
    }

    /// 未命中次数
    pub async fn misses(&self) -> u64 {
        self.state.lock().await.misses
    }

    /// 当前条目数
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 读取条目但不计数
    pub async fn peek(&self, id: EntryId) -> Option<Entry> {
        self.state.lock().await.entries.get(&id).cloned()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    #[instrument(skip(self), level = "debug")]
    async fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        let mut state = self.state.lock().await;
        let found = state.entries.get(&id).cloned();
        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        debug!("cache get: id={}, found={}", id, found.is_some());
        Ok(found)
    }

    #[instrument(skip(self, entry), level = "debug")]
    async fn put(&self, id: EntryId, entry: Entry) -> Result<()> {
        self.state.lock().await.entries.insert(id, entry);
        debug!("cache put: id={}", id);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn invalidate(&self, id: EntryId) -> Result<()> {
        let removed = self.state.lock().await.entries.remove(&id).is_some();
        debug!("cache invalidate: id={}, removed={}", id, removed);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = CacheState::default();
        debug!("cache cleared");
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            len: state.entries.len(),
        }
    }
}
