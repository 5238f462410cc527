// ==========================================
// 采购计划管理系统 - 推荐规则导入
// ==========================================
// 表头: 采购标的 / 计划发放 / 权重 / 采购方式 / 采购途径（至少出现其一）
// ==========================================

use crate::domain::recommendation::RecommendationRule;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use std::path::Path;

pub const COL_ITEM: &str = "采购标的";
pub const COL_PURCHASER: &str = "计划发放";
pub const COL_WEIGHT: &str = "权重";
pub const COL_METHOD: &str = "采购方式";
pub const COL_CHANNEL: &str = "采购途径";

const RULE_COLUMNS: [&str; 5] = [COL_ITEM, COL_PURCHASER, COL_WEIGHT, COL_METHOD, COL_CHANNEL];

fn cell(record: &RawRecord, column: &str) -> String {
    record
        .get(column)
        .map(|v| v.trim())
        .filter(|v| !v.eq_ignore_ascii_case("nan"))
        .unwrap_or("")
        .to_string()
}

/// 行记录 → 推荐规则（标的为空的行跳过；权重无法解析按 0，导入的规则均启用）
pub fn rules_from_records(records: &[RawRecord]) -> ImportResult<Vec<RecommendationRule>> {
    let has_any_column = records
        .first()
        .map(|r| RULE_COLUMNS.iter().any(|c| r.contains_key(*c)))
        .unwrap_or(true);
    if !has_any_column {
        return Err(ImportError::MissingColumns(RULE_COLUMNS.join(", ")));
    }

    let rules = records
        .iter()
        .filter_map(|record| {
            let item_name = cell(record, COL_ITEM);
            if item_name.is_empty() {
                return None;
            }
            let weight = cell(record, COL_WEIGHT)
                .parse::<f64>()
                .map(|w| w as i64)
                .unwrap_or(0);
            let mut rule = RecommendationRule::new(item_name, cell(record, COL_PURCHASER), weight);
            rule.purchase_method = cell(record, COL_METHOD);
            rule.purchase_channel = cell(record, COL_CHANNEL);
            Some(rule)
        })
        .collect();
    Ok(rules)
}

/// 读取规则文件（CSV / Excel）
pub fn read_rule_file<P: AsRef<Path>>(path: P) -> ImportResult<Vec<RecommendationRule>> {
    let records = UniversalFileParser.parse(path)?;
    rules_from_records(&records)
}
