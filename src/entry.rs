//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了被缓存的记录类型。

use crate::error::{Result, StrategyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// 条目标识符
///
/// `0` 表示未分配的标识符，不能进入缓存或存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl EntryId {
    /// 未分配的标识符
    pub const UNASSIGNED: EntryId = EntryId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl From<u64> for EntryId {
    fn from(value: u64) -> Self {
        EntryId(value)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 缓存条目
///
/// 构造后不可变，更新通过替换整个条目完成。相等性和哈希仅基于 `id`，
/// 比较内容请使用 [`Entry::same_content`]。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    id: EntryId,
    title: String,
    body: String,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// 校验条目，在接触缓存或存储之前调用
    pub fn validate(&self) -> Result<()> {
        if !self.id.is_assigned() {
            return Err(StrategyError::InvalidEntry(format!(
                "entry '{}' has an unassigned identifier",
                self.title
            )));
        }
        Ok(())
    }

    /// 比较标识符和全部字段
    pub fn same_content(&self, other: &Entry) -> bool {
        self.id == other.id && self.title == other.title && self.body == other.body
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
