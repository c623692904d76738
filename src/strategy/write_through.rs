//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 直写（write-through）策略。

use super::{read_cache_first, CacheStrategy, MissFill, StrategyKind};
use crate::backend::{CacheBackend, StoreBackend};
use crate::entry::{Entry, EntryId};
use crate::error::Result;
use crate::metrics::GLOBAL_METRICS;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// 直写策略
///
/// 写入先落存储，成功后再写缓存，两步都完成后才返回。
/// 存储写入失败时直接返回错误，缓存保持不变，缓存永远不会领先于存储。
pub struct WriteThroughStrategy {
    service_name: String,
    cache: Arc<dyn CacheBackend>,
    store: Arc<dyn StoreBackend>,
    /// 串行化写入，避免两次写入的存储/缓存步骤交错
    write_lock: Mutex<()>,
}

impl WriteThroughStrategy {
    pub fn new(
        service_name: impl Into<String>,
        cache: Arc<dyn CacheBackend>,
        store: Arc<dyn StoreBackend>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            cache,
            store,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl CacheStrategy for WriteThroughStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WriteThrough
    }

    fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 未命中时持有写锁回源并回填，回填的值不会晚于已完成的写入
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        read_cache_first(
            &self.service_name,
            self.cache.as_ref(),
            self.store.as_ref(),
            id,
            MissFill::Serialized(&self.write_lock),
        )
        .await
    }

    #[instrument(skip(self, entry), level = "debug", fields(service = %self.service_name, id = %entry.id()))]
    async fn update(&self, entry: Entry) -> Result<()> {
        entry.validate()?;
        let start = Instant::now();
        let id = entry.id();

        let _guard = self.write_lock.lock().await;

        if let Err(e) = self.store.save(entry.clone()).await {
            GLOBAL_METRICS.record_request(&self.service_name, "store", "save", "failure");
            error!("update id={}: store save failed, cache left untouched: {}", id, e);
            return Err(e);
        }
        GLOBAL_METRICS.record_request(&self.service_name, "store", "save", "success");

        self.cache.put(id, entry).await?;
        GLOBAL_METRICS.record_request(&self.service_name, "cache", "put", "success");

        GLOBAL_METRICS.record_duration(
            &self.service_name,
            "strategy",
            "update",
            start.elapsed().as_secs_f64(),
        );
        debug!("update id={}: store and cache updated", id);
        Ok(())
    }
}
