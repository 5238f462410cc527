// ==========================================
// 采购计划管理系统 - 明细账本
// ==========================================
// 职责: 整单保存（先删后插 + 发放分组同步，同一事务）与序号校验
// 红线: 保存是替换而非合并，未出现在输入中的明细即被删除
// 红线: 同步不可跳过；任一步失败整体回滚
// ==========================================

use crate::domain::detail::{DetailEntry, DetailLine};
use crate::domain::release::ReleaseSyncOutcome;
use crate::engine::identifier::SuffixOrder;
use crate::engine::sequence::{validate_suffixes, SequenceReport};
use crate::repository::detail_repo::DetailRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::release_repo::ReleaseGroupRepository;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 整单保存结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSaveOutcome {
    pub saved: usize,
    pub release: ReleaseSyncOutcome,
}

/// 明细账本
///
/// 并发约束：同一单号的两次保存若交错执行，后提交者会整单覆盖先提交者
/// （丢失更新）。单机单用户场景下不做防护，调用方不得对同一单号并发保存。
pub struct DetailLedger {
    conn: Arc<Mutex<Connection>>,
    details: DetailRepository,
}

impl DetailLedger {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            details: DetailRepository::from_connection(conn.clone()),
            conn,
        }
    }

    /// 整单保存，新建分组的发放日期取当天
    pub fn save_full_set(
        &self,
        order_number: &str,
        entries: &[DetailEntry],
    ) -> RepositoryResult<LedgerSaveOutcome> {
        self.save_full_set_on(order_number, entries, Local::now().date_naive())
    }

    /// 整单保存（指定“今天”）
    pub fn save_full_set_on(
        &self,
        order_number: &str,
        entries: &[DetailEntry],
        today: NaiveDate,
    ) -> RepositoryResult<LedgerSaveOutcome> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        let saved = DetailRepository::replace_in_tx(&tx, order_number, entries)?;
        let release = ReleaseGroupRepository::sync_in_tx(&tx, order_number, today)?;

        tx.commit()?;

        tracing::info!(
            order_number,
            saved,
            created = release.created,
            updated = release.updated,
            deleted = release.deleted,
            "明细整单保存完成"
        );
        Ok(LedgerSaveOutcome { saved, release })
    }

    /// 序号校验（只读，不修复）
    pub fn validate(&self, order_number: &str) -> RepositoryResult<SequenceReport> {
        let numbers = self.details.detail_numbers_for_order(order_number)?;
        Ok(validate_suffixes(numbers.iter().map(String::as_str)))
    }

    /// 录入视图（大号在前）
    pub fn entry_view(&self, order_number: &str) -> RepositoryResult<Vec<DetailLine>> {
        self.details.find_entry_view(order_number)
    }

    /// 导出/发放侧读取（小号在前）
    pub fn ascending_view(&self, order_number: &str) -> RepositoryResult<Vec<DetailLine>> {
        self.details
            .find_by_order_sorted(order_number, SuffixOrder::Ascending)
    }
}
