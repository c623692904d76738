//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了模拟的慢速持久存储，每次读写都带有固定延迟。

use super::{StoreBackend, StoreStats};
use crate::config::StoreConfig;
use crate::entry::{Entry, EntryId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// 默认的单次操作延迟（毫秒）
pub const DEFAULT_LATENCY_MS: u64 = 10;

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<EntryId, Entry>,
    read_count: u64,
    write_count: u64,
}

/// 模拟存储后端
///
/// 计数在进入延迟之前累加，延迟期间不持有锁，允许并发调用方重叠等待
#[derive(Debug)]
pub struct SimulatedStore {
    state: Mutex<StoreState>,
    latency: Duration,
}

impl Default for SimulatedStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LATENCY_MS))
    }
}

impl SimulatedStore {
    /// 创建具有给定单次操作延迟的存储
    pub fn new(latency: Duration) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            latency,
        }
    }

    /// 根据存储配置创建
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(Duration::from_millis(config.latency_ms))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub async fn read_count(&self) -> u64 {
        self.state.lock().await.read_count
    }

    pub async fn write_count(&self) -> u64 {
        self.state.lock().await.write_count
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 读取条目，不计数也不模拟延迟
    pub async fn peek(&self, id: EntryId) -> Option<Entry> {
        self.state.lock().await.entries.get(&id).cloned()
    }

    /// 直接写入初始数据，不计数也不模拟延迟
    pub async fn seed(&self, entries: impl IntoIterator<Item = Entry>) {
        let mut state = self.state.lock().await;
        for entry in entries {
            state.entries.insert(entry.id(), entry);
        }
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl StoreBackend for SimulatedStore {
    #[instrument(skip(self), level = "debug")]
    async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>> {
        self.state.lock().await.read_count += 1;
        self.simulate_latency().await;
        let found = self.state.lock().await.entries.get(&id).cloned();
        debug!("store find_by_id: id={}, found={}", id, found.is_some());
        Ok(found)
    }

    #[instrument(skip(self, entry), level = "debug", fields(id = %entry.id()))]
    async fn save(&self, entry: Entry) -> Result<()> {
        self.state.lock().await.write_count += 1;
        self.simulate_latency().await;
        let id = entry.id();
        self.state.lock().await.entries.insert(id, entry);
        debug!("store save: id={}", id);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn clear(&self) -> Result<()> {
        *self.state.lock().await = StoreState::default();
        debug!("store cleared");
        Ok(())
    }

    async fn stats(&self) -> StoreStats {
        let state = self.state.lock().await;
        StoreStats {
            read_count: state.read_count,
            write_count: state.write_count,
            len: state.entries.len(),
        }
    }
}
