//! oxstrat - 缓存一致性策略
//!
//! 在共享的内存缓存和慢速持久存储之上实现旁路缓存（cache-aside）、
//! 直写（write-through）和写后（write-behind）三种策略，
//! 并提供用相同输入对比三者一致性与延迟表现的工具。

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use tokio;

pub mod backend;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod strategy;
pub mod telemetry;

// Re-export commonly used items
pub use backend::{CacheBackend, MemoryCache, SimulatedStore, StoreBackend};
pub use config::Config;
pub use entry::{Entry, EntryId};
pub use error::{Result, StrategyError};
pub use harness::{Comparison, Operation, StrategyHarness, StrategyReport, Workload};
pub use strategy::{
    build_strategy, CacheAsideStrategy, CacheStrategy, StrategyKind, WriteBehindStrategy,
    WriteThroughStrategy,
};

/// oxstrat 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
