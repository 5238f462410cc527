// ==========================================
// 采购计划管理系统 - 月度计划 / 统计领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 月度预算计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPlan {
    pub id: Option<i64>,
    pub plan_month: String,
    pub item_name: String,
    pub spec_model: String,
    pub unit: String,
    pub plan_qty: f64,
    pub plan_budget: f64,
    pub department: String,
    pub remarks: String,
}

/// 月度计划 + 执行情况（按标的名称+规格型号关联明细）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPlanExecution {
    pub plan: MonthlyPlan,
    pub executed_qty: f64,
    pub executed_amount: f64,
}

/// 工作台统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbenchStats {
    pub total_plans: i64,
    pub pending_plans: i64,
    pub processed_plans: i64,
    pub civil_count: i64,
    pub machined_count: i64,
    pub semi_count: i64,
    pub total_amount: f64,
    pub civil_amount: f64,
    pub machined_amount: f64,
    pub semi_amount: f64,
}

/// 月度导出行（只提供有序数据，不做格式化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyExportRow {
    pub order_number: String,
    pub task_name: String,
    pub category_code: String,
    pub order_unit: String,
    pub order_date: String,
    pub detail_no: String,
    pub item_name: String,
    pub purchase_item: String,
    pub spec_model: String,
    pub unit: String,
    pub quantity: String,
    pub budget: String,
    pub purchase_method: String,
    pub purchase_channel: String,
    pub plan_release: String,
    pub inquiry_price: String,
    pub supplier: String,
    pub remark: String,
    pub plan_time: String,
}

/// 操作日志（审计）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLog {
    pub id: Option<i64>,
    pub order_number: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub operator: String,
    pub op_time: NaiveDateTime,
}
