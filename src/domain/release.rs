// ==========================================
// 采购计划管理系统 - 计划发放（发放分组）领域模型
// ==========================================
// 发放分组 = 主单 × 采购员，完全由明细派生
// 唯一允许人工修改的字段是 status
// ==========================================

use crate::domain::types::ReleaseStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGroup {
    pub id: i64,
    pub source_order_number: String,
    pub purchaser: String,
    pub release_date: Option<NaiveDate>,
    pub status: ReleaseStatus,
    pub record_count: i64,
}

/// 发放列表行（关联主单信息，主单缺失时为 None）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseGroupView {
    pub group: ReleaseGroup,
    pub task_name: Option<String>,
    pub unit: Option<String>,
    pub year_month: Option<String>,
}

/// 发放列表过滤条件（子串匹配）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseFilter {
    pub number: Option<String>,
    pub purchaser: Option<String>,
    pub task_name: Option<String>,
    pub year_month: Option<String>,
    pub unit: Option<String>,
}

/// 一次同步对发放分组造成的变化
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSyncOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}
