//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存策略的错误类型和处理机制。

use thiserror::Error;

/// 缓存策略错误类型枚举
///
/// 缓存未命中不是错误，统一以 `Ok(None)` 表示
#[derive(Error, Debug)]
pub enum StrategyError {
    /// 条目不合法（例如标识符未分配）
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// 策略已关闭，拒绝新的写入
    #[error("Strategy has been shut down: {0}")]
    ShutDown(String),

    /// 存储操作失败
    #[error("Store operation failed: {0}")]
    StoreError(String),

    /// 缓存操作失败
    #[error("Cache operation failed: {0}")]
    CacheError(String),

    /// 后台写入任务异常退出
    #[error("Write-behind worker failed: {0}")]
    WorkerError(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML解析错误
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// 策略操作结果类型别名
pub type Result<T> = std::result::Result<T, StrategyError>;
