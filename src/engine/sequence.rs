// ==========================================
// 采购计划管理系统 - 明细序号校验
// ==========================================
// 红线: 只报告重复/缺失，绝不自动修复
// ==========================================

use crate::engine::identifier::parse_detail_suffix;
use crate::i18n::{join_numbers, t, t_with_args};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 缺失序号最多列出的个数
pub const MISSING_REPORT_LIMIT: usize = 50;

/// 序号校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub ok: bool,
    /// 出现 ≥2 次的序号（升序）
    pub duplicates: Vec<i64>,
    /// [1, max] 中缺失的序号（升序，最多 MISSING_REPORT_LIMIT 个）
    pub missing: Vec<i64>,
    /// 缺失序号总数（可能多于 missing 中列出的个数）
    pub missing_total: u64,
}

impl SequenceReport {
    /// 人工可读的摘要
    pub fn summary(&self) -> String {
        let mut issues = Vec::new();
        if !self.duplicates.is_empty() {
            issues.push(t_with_args(
                "sequence.duplicates",
                &[("values", &join_numbers(&self.duplicates))],
            ));
        }
        if !self.missing.is_empty() {
            let values = join_numbers(&self.missing);
            if self.missing_total > self.missing.len() as u64 {
                issues.push(t_with_args(
                    "sequence.missing_truncated",
                    &[("values", &values), ("count", &self.missing_total.to_string())],
                ));
            } else {
                issues.push(t_with_args("sequence.missing", &[("values", &values)]));
            }
        }
        if issues.is_empty() {
            t("sequence.ok")
        } else {
            issues.join("; ")
        }
    }
}

/// 校验一组明细号的后缀序号
pub fn validate_suffixes<'a, I>(detail_nos: I) -> SequenceReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: BTreeMap<i64, usize> = BTreeMap::new();
    for n in detail_nos.into_iter().filter_map(parse_detail_suffix) {
        *seen.entry(n).or_insert(0) += 1;
    }

    let duplicates: Vec<i64> = seen
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(n, _)| *n)
        .collect();

    // 只遍历相邻已用序号之间的空档，耗时与明细条数相关而非与最大序号相关
    let mut missing = Vec::new();
    let mut missing_total: u64 = 0;
    let mut prev: i64 = 0;
    for &n in seen.keys() {
        let gap_start = prev + 1;
        if n > gap_start {
            missing_total += (n - gap_start) as u64;
            let room = MISSING_REPORT_LIMIT - missing.len();
            missing.extend((gap_start..n).take(room));
        }
        prev = n;
    }

    SequenceReport {
        ok: duplicates.is_empty() && missing_total == 0,
        duplicates,
        missing,
        missing_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_and_missing_reported_together() {
        let nos = ["2601MP-1", "2601MP-2", "2601MP-2", "2601MP-4"];
        let report = validate_suffixes(nos.iter().copied());
        assert!(!report.ok);
        assert_eq!(report.duplicates, vec![2]);
        assert_eq!(report.missing, vec![3]);
        assert_eq!(report.missing_total, 1);
        let summary = report.summary();
        assert!(summary.contains('2'));
        assert!(summary.contains('3'));
    }

    #[test]
    fn test_contiguous_sequence_is_ok_and_idempotent() {
        let nos = ["2601MP-3", "2601MP-1", "2601MP-2"];
        let first = validate_suffixes(nos.iter().copied());
        let second = validate_suffixes(nos.iter().copied());
        assert!(first.ok);
        assert_eq!(first, second);
    }

    #[test]
    fn test_huge_suffix_reports_bounded_missing_list() {
        let nos = ["2601MP-1", "2601MP-300000000"];
        let report = validate_suffixes(nos.iter().copied());
        assert!(!report.ok);
        assert_eq!(report.missing.len(), MISSING_REPORT_LIMIT);
        assert_eq!(report.missing[0], 2);
        assert_eq!(report.missing_total, 299_999_998);
        assert!(report.summary().contains("299999998"));
    }

    #[test]
    fn test_missing_list_spans_several_gaps() {
        let nos = ["2601MP-2", "2601MP-5", "2601MP-7"];
        let report = validate_suffixes(nos.iter().copied());
        assert_eq!(report.missing, vec![1, 3, 4, 6]);
        assert_eq!(report.missing_total, 4);
    }

    #[test]
    fn test_malformed_numbers_are_ignored() {
        let nos = ["2601MP-1", "2601MP-?", "", "2601MP-0", "2601MP-2"];
        assert!(validate_suffixes(nos.iter().copied()).ok);
    }

    #[test]
    fn test_empty_order_is_ok() {
        assert!(validate_suffixes(std::iter::empty()).ok);
    }
}
