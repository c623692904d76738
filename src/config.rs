//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了策略运行的配置结构和解析逻辑。

use crate::backend::store::DEFAULT_LATENCY_MS;
use crate::error::{Result, StrategyError};
use crate::strategy::StrategyKind;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub config_version: Option<u32>,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub write_behind: WriteBehindConfig,
    #[serde(default)]
    pub harness: HarnessConfig,
}

/// 全局配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GlobalConfig {
    /// 日志过滤表达式，`RUST_LOG` 优先
    pub log_filter: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
        }
    }
}

/// 模拟存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 单次读写延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }
}

/// 写后（write-behind）策略配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct WriteBehindConfig {
    /// 待写入队列长度超过该值时输出警告，0表示禁用
    pub queue_warn_threshold: usize,
}

impl Default for WriteBehindConfig {
    fn default() -> Self {
        Self {
            queue_warn_threshold: 1000,
        }
    }
}

/// 对比测试配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct HarnessConfig {
    /// 参与对比的策略
    pub strategies: Vec<StrategyKind>,
    /// 标准负载中的条目数量
    pub entries: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::ALL.to_vec(),
            entries: 5,
        }
    }
}

impl Config {
    /// 从TOML字符串解析并验证配置
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate().map_err(StrategyError::ConfigError)?;
        Ok(config)
    }

    /// 从文件加载并验证配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// 验证配置
    ///
    /// 检查各字段是否在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(version) = &self.config_version {
            if *version > CONFIG_VERSION {
                return Err(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                ));
            }
        }

        if self.global.log_filter.trim().is_empty() {
            return Err("Global log_filter cannot be empty".to_string());
        }

        if self.store.latency_ms > 60_000 {
            return Err("Store latency_ms cannot exceed 60000 ms".to_string());
        }

        if self.harness.strategies.is_empty() {
            return Err("Harness strategies cannot be empty".to_string());
        }

        for (i, kind) in self.harness.strategies.iter().enumerate() {
            if self.harness.strategies[..i].contains(kind) {
                return Err(format!("Harness strategy '{}' is listed twice", kind));
            }
        }

        if self.harness.entries == 0 || self.harness.entries > 10_000 {
            return Err("Harness entries must be between 1 and 10000".to_string());
        }

        Ok(())
    }
}
