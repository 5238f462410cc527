// ==========================================
// 采购计划管理系统 - 推荐库领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 推荐规则：标的名称子串 → 采购员/采购方式/采购途径
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub id: Option<i64>,
    pub item_name: String,
    pub purchaser: String,
    pub weight: i64,
    pub is_active: bool,
    pub purchase_method: String,
    pub purchase_channel: String,
}

impl RecommendationRule {
    pub fn new(item_name: impl Into<String>, purchaser: impl Into<String>, weight: i64) -> Self {
        Self {
            id: None,
            item_name: item_name.into(),
            purchaser: purchaser.into(),
            weight,
            is_active: true,
            purchase_method: String::new(),
            purchase_channel: String::new(),
        }
    }
}

/// 匹配结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationHint {
    pub purchaser: String,
    pub purchase_method: String,
    pub purchase_channel: String,
}

/// 历史已发放明细中提取的同步候选
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleasedItem {
    pub purchase_item: String,
    pub purchaser: String,
    pub purchase_method: String,
    pub purchase_channel: String,
}

/// 单批写入结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInsertOutcome {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

/// 同步进度 (已处理, 总数)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub done: usize,
    pub total: usize,
}

impl SyncProgress {
    /// 百分比（总数为 0 时视为 100）
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            100
        } else {
            ((self.done.min(self.total) * 100) / self.total) as u8
        }
    }
}

/// 整次同步汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: String,
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<String>,
    pub cancelled: bool,
}

/// 同步日志
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: i64,
    pub run_id: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub total_candidates: i64,
    pub inserted: i64,
    pub skipped: i64,
    pub failed: i64,
    pub details: String,
}
