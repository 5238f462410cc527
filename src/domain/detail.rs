// ==========================================
// 采购计划管理系统 - 采购明细领域模型
// ==========================================
// 红线: 明细只随主单整单保存，不单独落库
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DetailFields - 明细业务字段
// ==========================================
// 数值类字段按界面录入原文保存（允许千分位/空值）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailFields {
    pub item_name: String,        // 标的名称
    pub purchase_item: String,    // 采购标的
    pub spec_model: String,       // 规格型号
    pub purchase_cycle: String,   // 采购周期
    pub stock_count: String,      // 库存数量
    pub quantity: String,         // 采购数量
    pub unit: String,             // 单位
    pub unit_price: String,       // 单价(元)
    pub budget: String,           // 预算(万元)
    pub purchase_method: String,  // 采购方式
    pub purchase_channel: String, // 采购途径
    pub plan_time: String,        // 计划时间
    pub demand_unit: String,      // 需求单位
    pub plan_release: String,     // 计划发放（采购员，空 = 未分配）
    pub progress_req: String,     // 进度要求
    pub supplier: String,         // 供应商
    pub inquiry_price: String,    // 询价金额
    pub tax_rate: String,         // 税率
    pub actual_status: String,    // 实际状态
    pub purchase_body: String,    // 采购主体
    pub add_adjust: String,       // 增补调整
    pub remark: String,           // 备注
}

impl DetailFields {
    /// 已分配采购员（去除首尾空白后非空）
    pub fn assigned_purchaser(&self) -> Option<&str> {
        let p = self.plan_release.trim();
        if p.is_empty() {
            None
        } else {
            Some(self.plan_release.as_str())
        }
    }
}

/// 整单保存时的一行输入：明细号 + 字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub detail_no: String,
    pub fields: DetailFields,
}

impl DetailEntry {
    pub fn new(detail_no: impl Into<String>, fields: DetailFields) -> Self {
        Self {
            detail_no: detail_no.into(),
            fields,
        }
    }
}

// ==========================================
// DetailLine - 已落库的明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailLine {
    pub id: i64,
    pub order_number: String,
    pub detail_no: String,
    pub fields: DetailFields,
}

impl DetailLine {
    /// 明细号后缀序号（不可解析时为 None）
    pub fn sequence(&self) -> Option<i64> {
        crate::engine::identifier::parse_detail_suffix(&self.detail_no)
    }
}
