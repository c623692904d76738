//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块负责初始化日志输出。

use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// 初始化 tracing subscriber
///
/// 设置了 `RUST_LOG` 时以环境变量为准，否则使用 `filter`。
/// 重复调用或已有全局 subscriber 时静默忽略。
pub fn init_tracing(filter: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
        tracing_subscriber::fmt()
            .with_span_events(FmtSpan::CLOSE)
            .with_env_filter(env_filter)
            .try_init()
            .ok();
    });
}
