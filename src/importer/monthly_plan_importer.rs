// ==========================================
// 采购计划管理系统 - 月度计划导入
// ==========================================
// 必需列: 标的名称
// 可选列: 规格型号 / 单位 / 计划数量 / 计划预算 / 需求部门 / 备注
// ==========================================

use crate::domain::monthly_plan::MonthlyPlan;
use crate::engine::identifier::is_valid_year_month;
use crate::engine::money::parse_amount;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use std::path::Path;

pub const COL_ITEM: &str = "标的名称";
pub const COL_SPEC: &str = "规格型号";
pub const COL_UNIT: &str = "单位";
pub const COL_QTY: &str = "计划数量";
pub const COL_BUDGET: &str = "计划预算";
pub const COL_DEPARTMENT: &str = "需求部门";
pub const COL_REMARKS: &str = "备注";

fn cell(record: &RawRecord, column: &str) -> String {
    record
        .get(column)
        .map(|v| v.trim())
        .filter(|v| !v.eq_ignore_ascii_case("nan"))
        .unwrap_or("")
        .to_string()
}

/// 行记录 → 月度计划（标的为空的行跳过，数量/预算无法解析按 0）
pub fn plans_from_records(records: &[RawRecord], plan_month: &str) -> ImportResult<Vec<MonthlyPlan>> {
    if !is_valid_year_month(plan_month) {
        return Err(ImportError::InvalidPlanMonth(plan_month.to_string()));
    }
    if let Some(first) = records.first() {
        if !first.contains_key(COL_ITEM) {
            return Err(ImportError::MissingColumns(COL_ITEM.to_string()));
        }
    }

    let plans = records
        .iter()
        .filter_map(|record| {
            let item_name = cell(record, COL_ITEM);
            if item_name.is_empty() {
                return None;
            }
            Some(MonthlyPlan {
                id: None,
                plan_month: plan_month.to_string(),
                item_name,
                spec_model: cell(record, COL_SPEC),
                unit: cell(record, COL_UNIT),
                plan_qty: parse_amount(&cell(record, COL_QTY)).unwrap_or(0.0),
                plan_budget: parse_amount(&cell(record, COL_BUDGET)).unwrap_or(0.0),
                department: cell(record, COL_DEPARTMENT),
                remarks: cell(record, COL_REMARKS),
            })
        })
        .collect();
    Ok(plans)
}

/// 读取月度计划文件（CSV / Excel）
pub fn read_monthly_plan_file<P: AsRef<Path>>(path: P, plan_month: &str) -> ImportResult<Vec<MonthlyPlan>> {
    let records = UniversalFileParser.parse(path)?;
    plans_from_records(&records, plan_month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plans_from_records() {
        let records = vec![
            record(&[(COL_ITEM, "螺栓"), (COL_QTY, "10"), (COL_BUDGET, "1,500.5")]),
            record(&[(COL_ITEM, "nan"), (COL_QTY, "3")]),
            record(&[(COL_ITEM, "垫片"), (COL_QTY, "若干")]),
        ];
        let plans = plans_from_records(&records, "2601").unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].plan_qty, 10.0);
        assert_eq!(plans[0].plan_budget, 1500.5);
        assert_eq!(plans[1].plan_qty, 0.0);
        assert_eq!(plans[1].plan_month, "2601");
    }

    #[test]
    fn test_required_column_and_month() {
        let records = vec![record(&[("名称", "螺栓")])];
        assert!(matches!(
            plans_from_records(&records, "2601"),
            Err(ImportError::MissingColumns(_))
        ));
        assert!(matches!(
            plans_from_records(&[], "26"),
            Err(ImportError::InvalidPlanMonth(_))
        ));
    }
}
