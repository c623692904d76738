//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 旁路缓存（cache-aside，懒加载）策略。

use super::{read_cache_first, CacheStrategy, MissFill, StrategyKind};
use crate::backend::{CacheBackend, StoreBackend};
use crate::entry::{Entry, EntryId};
use crate::error::Result;
use crate::metrics::GLOBAL_METRICS;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// 旁路缓存策略
///
/// 读取时缓存未命中则回源并填充缓存；写入只落存储，不触碰缓存。
/// 因此已缓存的条目在更新后仍会返回旧值，直到该条目被单独失效。
pub struct CacheAsideStrategy {
    service_name: String,
    cache: Arc<dyn CacheBackend>,
    store: Arc<dyn StoreBackend>,
}

impl CacheAsideStrategy {
    pub fn new(
        service_name: impl Into<String>,
        cache: Arc<dyn CacheBackend>,
        store: Arc<dyn StoreBackend>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            cache,
            store,
        }
    }
}

#[async_trait]
impl CacheStrategy for CacheAsideStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CacheAside
    }

    fn service_name(&self) -> &str {
        &self.service_name
    }

    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        read_cache_first(
            &self.service_name,
            self.cache.as_ref(),
            self.store.as_ref(),
            id,
            MissFill::Populate,
        )
        .await
    }

    #[instrument(skip(self, entry), level = "debug", fields(service = %self.service_name, id = %entry.id()))]
    async fn update(&self, entry: Entry) -> Result<()> {
        entry.validate()?;
        let start = Instant::now();
        let id = entry.id();

        self.store.save(entry).await?;
        GLOBAL_METRICS.record_request(&self.service_name, "store", "save", "success");
        GLOBAL_METRICS.record_duration(
            &self.service_name,
            "strategy",
            "update",
            start.elapsed().as_secs_f64(),
        );
        debug!("update id={}: saved to store, cache untouched", id);
        Ok(())
    }
}
