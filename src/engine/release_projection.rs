// ==========================================
// 采购计划管理系统 - 发放分组投影
// ==========================================
// 职责: 由明细计算发放分组的增/改/删计划，以及单据汇总状态
// 红线: 分组 = 明细的忠实投影；无剩余明细的采购员分组必须删除
// ==========================================

use crate::domain::release::ReleaseGroup;
use crate::domain::types::{OrderProcessingStatus, ReleaseStatus};
use std::collections::{BTreeMap, HashSet};

/// 按采购员统计明细条数（忽略未分配）
///
/// 空白采购员视为未分配；其余名称原样作键，与按 plan_release 精确查询发放明细保持一致
pub fn tally_purchasers<'a, I>(plan_releases: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tally = BTreeMap::new();
    for purchaser in plan_releases {
        if purchaser.trim().is_empty() {
            continue;
        }
        *tally.entry(purchaser.to_string()).or_insert(0) += 1;
    }
    tally
}

/// 对现有分组的调整计划
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSyncPlan {
    /// (分组ID, 新条数)
    pub updates: Vec<(i64, i64)>,
    /// (采购员, 条数)，以“待发放”新建
    pub inserts: Vec<(String, i64)>,
    /// 需删除的分组ID
    pub deletes: Vec<i64>,
}

impl ReleaseSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// 比对现有分组与当前统计，生成调整计划
///
/// - 已存在的采购员：只刷新 record_count（状态、发放日期不动）
/// - 新采购员：新建
/// - 统计中不存在的采购员：删除（统计为空时即删除全部）
pub fn plan_release_sync(existing: &[ReleaseGroup], tally: &BTreeMap<String, i64>) -> ReleaseSyncPlan {
    let mut plan = ReleaseSyncPlan::default();
    let mut matched: HashSet<&str> = HashSet::new();

    for group in existing {
        match tally.get(&group.purchaser) {
            Some(count) => {
                matched.insert(group.purchaser.as_str());
                plan.updates.push((group.id, *count));
            }
            None => plan.deletes.push(group.id),
        }
    }

    for (purchaser, count) in tally {
        if !matched.contains(purchaser.as_str()) {
            plan.inserts.push((purchaser.clone(), *count));
        }
    }

    plan
}

/// 单据汇总状态
///
/// 任一分组未完成 → 未发放；否则有分组 → 已发放；无分组 → 未发放
pub fn rollup_status<'a, I>(statuses: I) -> OrderProcessingStatus
where
    I: IntoIterator<Item = &'a ReleaseStatus>,
{
    let mut any = false;
    for status in statuses {
        if status.is_outstanding() {
            return OrderProcessingStatus::Unreleased;
        }
        any = true;
    }
    if any {
        OrderProcessingStatus::Released
    } else {
        OrderProcessingStatus::Unreleased
    }
}
