// ==========================================
// 采购计划管理系统 - 采购计划（主单）领域模型
// ==========================================

use crate::domain::types::{Category, IdentityChangeMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 采购计划主单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub number: String,     // 主单号 CG-{yymm}{类别}{4位序号}
    pub year_month: String, // 年月 (如 "2601")
    pub category: Category, // 类别
    pub unit: String,       // 需求单位
    pub date: NaiveDate,    // 编制日期
    pub task_name: String,  // 任务名称
}

impl Order {
    /// 明细号前缀 {yymm}{类别}-
    pub fn detail_prefix(&self) -> String {
        crate::engine::identifier::detail_prefix(&self.year_month, self.category)
    }
}

/// 新建主单所需字段（单号由发号器生成）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub year_month: String,
    pub category: Category,
    pub unit: String,
    pub date: NaiveDate,
    pub task_name: String,
}

/// 主单列表过滤条件（均为子串匹配，空值忽略）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub number: Option<String>,
    pub task_name: Option<String>,
    pub unit: Option<String>,
    pub year_month: Option<String>,
}

/// 编辑主单信息的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIdentityUpdate {
    pub task_name: String,
    pub unit: String,
    pub category: Category,
    pub year_month: String,
}

/// 编辑主单信息的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityChangeOutcome {
    pub mode: IdentityChangeMode,
    pub old_number: String,
    pub new_number: String,
    /// 被重命名的明细行数（简单更新时为 0）
    pub renamed_details: usize,
    pub message: String,
}
