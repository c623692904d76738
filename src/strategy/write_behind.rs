//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 写后（write-behind / write-back）策略。
//!
//! 写入立即更新缓存并返回，存储写入提交到单工作者的 FIFO 队列中异步执行。
//! 队列只有一个工作者，因此存储看到的写入顺序与提交顺序一致。
//! `shutdown` 是调用方唯一的同步点：它停止接收新写入并等待队列排空。
//! 进程在缓存更新与存储落盘之间崩溃会丢失写入，这里不做恢复。

use super::{read_cache_first, CacheStrategy, MissFill, StrategyKind};
use crate::backend::{CacheBackend, StoreBackend};
use crate::config::WriteBehindConfig;
use crate::entry::{Entry, EntryId};
use crate::error::{Result, StrategyError};
use crate::metrics::GLOBAL_METRICS;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// 落盘失败的写入
///
/// 后台写入没有调用方可以接收错误，失败的条目保存在这里供检查
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub entry: Entry,
    pub error: String,
}

/// 后台写入统计
#[derive(Debug, Default)]
struct FlushCounters {
    /// 已提交但尚未处理完的写入
    pending: AtomicUsize,
    /// 成功落盘的写入
    flushed: AtomicU64,
    /// 落盘失败的写入
    failed: AtomicU64,
}

/// 写后策略
pub struct WriteBehindStrategy {
    service_name: String,
    cache: Arc<dyn CacheBackend>,
    store: Arc<dyn StoreBackend>,
    /// 队列发送端，同时作为提交锁：入队和缓存写入在同一把锁内完成，
    /// 保证缓存的更新顺序与队列顺序一致。`None` 表示已关闭。
    sender: Mutex<Option<mpsc::UnboundedSender<Entry>>>,
    /// 工作者任务句柄，`shutdown` 在持有该锁期间等待排空
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<FlushCounters>,
    dead_letters: Arc<Mutex<Vec<DeadLetter>>>,
    config: WriteBehindConfig,
}

impl WriteBehindStrategy {
    /// 创建写后策略并启动后台写入任务
    ///
    /// 必须在 tokio 运行时内调用
    pub fn new(
        service_name: impl Into<String>,
        cache: Arc<dyn CacheBackend>,
        store: Arc<dyn StoreBackend>,
        config: WriteBehindConfig,
    ) -> Result<Self> {
        let service_name = service_name.into();
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            StrategyError::WorkerError(format!(
                "write-behind strategy '{}' requires a tokio runtime: {}",
                service_name, e
            ))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(FlushCounters::default());
        let dead_letters = Arc::new(Mutex::new(Vec::new()));

        let worker = runtime.spawn(Self::run_worker(
            service_name.clone(),
            store.clone(),
            rx,
            counters.clone(),
            dead_letters.clone(),
        ));

        info!("write-behind strategy '{}' started", service_name);
        Ok(Self {
            service_name,
            cache,
            store,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            counters,
            dead_letters,
            config,
        })
    }

    /// 后台写入循环
    ///
    /// 按接收顺序逐个落盘，发送端全部关闭且队列为空后退出
    async fn run_worker(
        service_name: String,
        store: Arc<dyn StoreBackend>,
        mut rx: mpsc::UnboundedReceiver<Entry>,
        counters: Arc<FlushCounters>,
        dead_letters: Arc<Mutex<Vec<DeadLetter>>>,
    ) {
        debug!("write-behind worker '{}' running", service_name);

        while let Some(entry) = rx.recv().await {
            let id = entry.id();
            let start = Instant::now();

            match store.save(entry.clone()).await {
                Ok(()) => {
                    counters.flushed.fetch_add(1, Ordering::SeqCst);
                    GLOBAL_METRICS.record_request(&service_name, "queue", "flush", "success");
                    debug!("flushed id={} to store", id);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::SeqCst);
                    GLOBAL_METRICS.record_request(&service_name, "queue", "flush", "failure");
                    error!("failed to flush id={} to store: {}", id, e);
                    dead_letters.lock().await.push(DeadLetter {
                        entry,
                        error: e.to_string(),
                    });
                }
            }

            let remaining = counters
                .pending
                .fetch_sub(1, Ordering::SeqCst)
                .saturating_sub(1);
            GLOBAL_METRICS.set_write_queue_depth(&service_name, remaining);
            GLOBAL_METRICS.record_duration(
                &service_name,
                "queue",
                "flush",
                start.elapsed().as_secs_f64(),
            );
        }

        info!(
            "write-behind worker '{}' drained: flushed={}, failed={}",
            service_name,
            counters.flushed.load(Ordering::SeqCst),
            counters.failed.load(Ordering::SeqCst)
        );
    }

    /// 已提交但尚未落盘的写入数量
    pub fn pending_writes(&self) -> usize {
        self.counters.pending.load(Ordering::SeqCst)
    }

    /// 成功落盘的写入数量
    pub fn flushed_writes(&self) -> u64 {
        self.counters.flushed.load(Ordering::SeqCst)
    }

    /// 落盘失败的写入数量
    pub fn failed_writes(&self) -> u64 {
        self.counters.failed.load(Ordering::SeqCst)
    }

    /// 落盘失败的条目
    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.lock().await.clone()
    }

    /// 是否已关闭
    pub async fn is_shut_down(&self) -> bool {
        self.sender.lock().await.is_none()
    }
}

#[async_trait]
impl CacheStrategy for WriteBehindStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WriteBehind
    }

    fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 缓存未命中时直接读存储，不回填缓存；缓存只由写入保持热度
    #[instrument(skip(self), level = "debug", fields(service = %self.service_name))]
    async fn get(&self, id: EntryId) -> Result<Option<Entry>> {
        read_cache_first(
            &self.service_name,
            self.cache.as_ref(),
            self.store.as_ref(),
            id,
            MissFill::Skip,
        )
        .await
    }

    #[instrument(skip(self, entry), level = "debug", fields(service = %self.service_name, id = %entry.id()))]
    async fn update(&self, entry: Entry) -> Result<()> {
        entry.validate()?;
        let start = Instant::now();
        let id = entry.id();

        let sender = self.sender.lock().await;
        let Some(tx) = sender.as_ref() else {
            warn!("update id={} rejected: strategy is shut down", id);
            return Err(StrategyError::ShutDown(format!(
                "write-behind strategy '{}' no longer accepts writes",
                self.service_name
            )));
        };

        // 先入队再写缓存：工作者已退出时缓存保持不变，不会留下永远不落盘的值
        let depth = self.counters.pending.fetch_add(1, Ordering::SeqCst) + 1;
        GLOBAL_METRICS.set_write_queue_depth(&self.service_name, depth);
        if tx.send(entry.clone()).is_err() {
            let depth = self.counters.pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            GLOBAL_METRICS.set_write_queue_depth(&self.service_name, depth);
            error!("update id={}: write-behind worker is gone", id);
            return Err(StrategyError::WorkerError(format!(
                "write-behind worker for '{}' stopped unexpectedly",
                self.service_name
            )));
        }
        GLOBAL_METRICS.record_request(&self.service_name, "queue", "enqueue", "success");

        self.cache.put(id, entry).await?;
        GLOBAL_METRICS.record_request(&self.service_name, "cache", "put", "success");

        if self.config.queue_warn_threshold > 0 && depth > self.config.queue_warn_threshold {
            warn!(
                "write-behind queue depth {} exceeds threshold {}",
                depth, self.config.queue_warn_threshold
            );
        }

        GLOBAL_METRICS.record_duration(
            &self.service_name,
            "strategy",
            "update",
            start.elapsed().as_secs_f64(),
        );
        debug!("update id={}: cached and queued (depth={})", id, depth);
        Ok(())
    }

    /// 停止接收新写入并等待队列排空
    ///
    /// 重复调用是安全的；并发调用会等待第一次关闭完成
    #[instrument(skip(self), level = "info", fields(service = %self.service_name))]
    async fn shutdown(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        drop(self.sender.lock().await.take());

        let Some(handle) = worker.take() else {
            debug!("write-behind strategy already shut down");
            return Ok(());
        };

        info!(
            "shutting down write-behind strategy, draining {} pending writes",
            self.pending_writes()
        );
        handle
            .await
            .map_err(|e| StrategyError::WorkerError(e.to_string()))?;

        info!(
            "write-behind strategy shut down: flushed={}, failed={}",
            self.flushed_writes(),
            self.failed_writes()
        );
        Ok(())
    }
}

impl Drop for WriteBehindStrategy {
    fn drop(&mut self) {
        if self.sender.get_mut().is_some() {
            warn!(
                "write-behind strategy '{}' dropped without shutdown, {} pending writes drain in background",
                self.service_name,
                self.counters.pending.load(Ordering::SeqCst)
            );
        }
    }
}
