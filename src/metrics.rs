//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了策略运行时的指标收集。

use dashmap::DashMap;
use lazy_static::lazy_static;
use std::sync::Arc;
use tracing::{span, Level};

/// 指标收集器
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    /// 请求总数统计
    /// key: "service:layer:op:result"
    pub requests_total: Arc<DashMap<String, u64>>,
    /// 操作耗时
    /// key: "service:layer:op" -> (total_duration_secs, count)
    pub operation_duration: Arc<DashMap<String, (f64, u64)>>,
    /// 写后队列中尚未落盘的写入数
    pub write_queue_depth: Arc<DashMap<String, usize>>,
}

lazy_static! {
    /// 全局指标实例
    pub static ref GLOBAL_METRICS: Metrics = Metrics::default();
}

impl Metrics {
    /// 记录请求指标
    ///
    /// # 参数
    ///
    /// * `service` - 策略实例名称
    /// * `layer` - 所在层（cache/store/queue）
    /// * `op` - 操作类型（get/put/find/save）
    /// * `result` - 操作结果（hit/miss/found/absent/success/failure）
    pub fn record_request(&self, service: &str, layer: &str, op: &str, result: &str) {
        let span = span!(Level::TRACE, "strategy_request", service, layer, op, result);
        let _enter = span.enter();
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        *self.requests_total.entry(key).or_insert(0) += 1;
    }

    /// 记录操作耗时
    pub fn record_duration(&self, service: &str, layer: &str, op: &str, duration_secs: f64) {
        let key = format!("{}:{}:{}", service, layer, op);
        let mut entry = self.operation_duration.entry(key).or_insert((0.0, 0));
        entry.0 += duration_secs;
        entry.1 += 1;
    }

    /// 设置写后队列深度
    pub fn set_write_queue_depth(&self, service: &str, depth: usize) {
        self.write_queue_depth.insert(service.to_string(), depth);
    }

    /// 查询某个请求计数
    pub fn request_count(&self, service: &str, layer: &str, op: &str, result: &str) -> u64 {
        let key = format!("{}:{}:{}:{}", service, layer, op, result);
        self.requests_total.get(&key).map(|v| *v).unwrap_or(0)
    }
}

/// 获取指标字符串
///
/// 将所有指标格式化为文本，按键排序
pub fn get_metrics_string() -> String {
    let metrics = &GLOBAL_METRICS;

    let mut reqs: Vec<(String, u64)> = metrics
        .requests_total
        .iter()
        .map(|e| (e.key().clone(), *e.value()))
        .collect();
    reqs.sort();

    let mut dur: Vec<(String, (f64, u64))> = metrics
        .operation_duration
        .iter()
        .map(|e| (e.key().clone(), *e.value()))
        .collect();
    dur.sort_by(|a, b| a.0.cmp(&b.0));

    let mut depth: Vec<(String, usize)> = metrics
        .write_queue_depth
        .iter()
        .map(|e| (e.key().clone(), *e.value()))
        .collect();
    depth.sort();

    let mut output = String::new();
    for (k, v) in reqs {
        output.push_str(&format!("strategy_requests_total{{labels=\"{}\"}} {}\n", k, v));
    }
    for (k, (total, count)) in dur {
        // 服务名可能包含 ':'，层和操作固定是最后两段
        let mut parts = k.rsplitn(3, ':');
        let (Some(op), Some(layer), Some(service)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        output.push_str(&format!(
            "strategy_operation_duration_seconds_sum{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
            service, layer, op, total
        ));
        output.push_str(&format!(
            "strategy_operation_duration_seconds_count{{service=\"{}\", layer=\"{}\", operation=\"{}\"}} {}\n",
            service, layer, op, count
        ));
    }
    for (k, v) in depth {
        output.push_str(&format!(
            "strategy_write_queue_depth{{service=\"{}\"}} {}\n",
            k, v
        ));
    }
    output
}
