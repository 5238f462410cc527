// ==========================================
// 采购计划管理系统 - 单号格式与解析
// ==========================================
// 主单号: CG-{yymm}{类别}{4位补零序号}   例: CG-2601MP0007
// 明细号: {yymm}{类别}-{序号，不补零}     例: 2601MP-7
// 红线: 格式逐字节兼容历史数据
// ==========================================

use crate::domain::types::Category;
use std::cmp::Ordering;

/// 主单号前缀
pub const MAIN_NUMBER_PREFIX: &str = "CG-";

/// 年月标记是否合法（4 位数字，如 "2601"）
pub fn is_valid_year_month(year_month: &str) -> bool {
    year_month.len() == 4 && year_month.bytes().all(|b| b.is_ascii_digit())
}

/// 格式化主单号
pub fn format_main_number(year_month: &str, category: Category, seq: i64) -> String {
    format!("{}{}{}{:04}", MAIN_NUMBER_PREFIX, year_month, category.code(), seq)
}

/// 明细号前缀 {yymm}{类别}-
pub fn detail_prefix(year_month: &str, category: Category) -> String {
    format!("{}{}-", year_month, category.code())
}

/// 格式化明细号
pub fn format_detail_number(year_month: &str, category: Category, seq: i64) -> String {
    format!("{}{}", detail_prefix(year_month, category), seq)
}

/// 取明细号最后一个 '-' 之后的整数序号
///
/// 空串、无 '-'、后缀非正整数或超出 i64 一律返回 None（不参与计算，也不报错）
pub fn parse_detail_suffix(detail_no: &str) -> Option<i64> {
    let (_, suffix) = detail_no.rsplit_once('-')?;
    suffix.trim().parse::<i64>().ok().filter(|n| *n > 0)
}

/// 一组明细号中的最大序号（无有效序号时为 0）
pub fn max_suffix<'a, I>(detail_nos: I) -> i64
where
    I: IntoIterator<Item = &'a str>,
{
    detail_nos
        .into_iter()
        .filter_map(parse_detail_suffix)
        .max()
        .unwrap_or(0)
}

/// 下一个明细序号 = 现存最大序号 + 1
///
/// 删除最高号后再新增会复用该号；中间空号不回填。
/// 现存最大序号已到 i64::MAX 时返回 None
pub fn next_detail_sequence<'a, I>(detail_nos: I) -> Option<i64>
where
    I: IntoIterator<Item = &'a str>,
{
    max_suffix(detail_nos).checked_add(1)
}

/// 改号时替换明细号前缀，保留后缀
///
/// 不以旧前缀开头的明细号返回 None（保持原样）
pub fn rewrite_detail_prefix(detail_no: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    detail_no
        .strip_prefix(old_prefix)
        .map(|suffix| format!("{}{}", new_prefix, suffix))
}

// ==========================================
// 明细排序
// ==========================================

/// 按序号排序的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixOrder {
    /// 录入视图：大号在前
    Descending,
    /// 发放/导出视图：小号在前
    Ascending,
}

/// 比较两个明细号
///
/// 无法解析的序号在两个方向上都排在最后
pub fn compare_detail_numbers(a: &str, b: &str, order: SuffixOrder) -> Ordering {
    match (parse_detail_suffix(a), parse_detail_suffix(b)) {
        (Some(x), Some(y)) => match order {
            SuffixOrder::Ascending => x.cmp(&y),
            SuffixOrder::Descending => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// 稳定排序：同序号保持原有（入库）顺序
pub fn sort_by_detail_suffix<T, F>(items: &mut [T], order: SuffixOrder, detail_no: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare_detail_numbers(detail_no(a), detail_no(b), order));
}
