// ==========================================
// 采购计划管理系统 - 发号器
// ==========================================
// 主单号: 持久计数器，只增不减（删除不回收）
// 明细号: 扫描现存明细取 max+1（删除最高号后复用）
// 计数器以 trait 注入，测试可替换为内存实现
// ==========================================

use crate::domain::types::Category;
use crate::engine::identifier::{
    detail_prefix, format_detail_number, format_main_number, next_detail_sequence,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::sync::Arc;

/// 主单号计数器（读-增-写须原子）
pub trait CounterStore: Send + Sync {
    fn next_main_sequence(&self, year_month: &str, category: Category) -> RepositoryResult<i64>;
}

/// 现存明细号来源
pub trait DetailNumberSource: Send + Sync {
    /// 全库中以 prefix 开头的明细号
    fn detail_numbers_with_prefix(&self, prefix: &str) -> RepositoryResult<Vec<String>>;
}

// ==========================================
// IdentifierGenerator - 单号生成
// ==========================================
pub struct IdentifierGenerator {
    counter: Arc<dyn CounterStore>,
    details: Arc<dyn DetailNumberSource>,
}

impl IdentifierGenerator {
    pub fn new(counter: Arc<dyn CounterStore>, details: Arc<dyn DetailNumberSource>) -> Self {
        Self { counter, details }
    }

    /// 生成主单号 CG-{yymm}{类别}{4位序号}，占用一个计数器序号
    pub fn mint_main_number(&self, year_month: &str, category: Category) -> RepositoryResult<String> {
        let seq = self.counter.next_main_sequence(year_month, category)?;
        let number = format_main_number(year_month, category, seq);
        tracing::info!(year_month, category = category.code(), seq, "生成主单号 {}", number);
        Ok(number)
    }

    /// 生成下一个明细号 {yymm}{类别}-{max+1}
    ///
    /// 不占用任何计数器；调用方在保存前再次发号可能得到同一号码
    pub fn mint_detail_number(&self, year_month: &str, category: Category) -> RepositoryResult<String> {
        let prefix = detail_prefix(year_month, category);
        let existing = self.details.detail_numbers_with_prefix(&prefix)?;
        let seq = next_detail_sequence(existing.iter().map(String::as_str)).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "detail_no".to_string(),
                message: format!("{} 下的明细序号已达上限", prefix),
            }
        })?;
        let number = format_detail_number(year_month, category, seq);
        tracing::debug!(prefix = prefix.as_str(), seq, "生成明细号 {}", number);
        Ok(number)
    }
}
