// ==========================================
// 采购计划管理系统 - 采购计划 API
// ==========================================
// 职责: 主单发号/保存/查询、明细整单保存与序号校验、主单信息变更
// 红线: 输入先校验再落库；错误统一转换为 ApiError
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::detail::{DetailEntry, DetailLine};
use crate::domain::monthly_plan::OperationLog;
use crate::domain::order::{IdentityChangeOutcome, NewOrder, Order, OrderFilter, OrderIdentityUpdate};
use crate::domain::types::{Category, OrderProcessingStatus};
use crate::engine::identifier::{format_main_number, is_valid_year_month};
use crate::engine::ledger::{DetailLedger, LedgerSaveOutcome};
use crate::engine::numbering::IdentifierGenerator;
use crate::engine::identity::OrderIdentityMutator;
use crate::engine::sequence::SequenceReport;
use crate::i18n::t_with_args;
use crate::repository::{
    CounterRepository, DetailRepository, OperationLogRepository, OrderRepository,
    ReleaseGroupRepository, RepositoryError,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 采购计划 API
pub struct OrderApi {
    conn: Arc<Mutex<Connection>>,
    order_repo: Arc<OrderRepository>,
    detail_repo: Arc<DetailRepository>,
    release_repo: Arc<ReleaseGroupRepository>,
    counter_repo: Arc<CounterRepository>,
    op_log_repo: Arc<OperationLogRepository>,
    generator: Arc<IdentifierGenerator>,
    ledger: Arc<DetailLedger>,
    mutator: Arc<OrderIdentityMutator>,
}

impl OrderApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        order_repo: Arc<OrderRepository>,
        detail_repo: Arc<DetailRepository>,
        release_repo: Arc<ReleaseGroupRepository>,
        counter_repo: Arc<CounterRepository>,
        op_log_repo: Arc<OperationLogRepository>,
        generator: Arc<IdentifierGenerator>,
        ledger: Arc<DetailLedger>,
        mutator: Arc<OrderIdentityMutator>,
    ) -> Self {
        Self {
            conn,
            order_repo,
            detail_repo,
            release_repo,
            counter_repo,
            op_log_repo,
            generator,
            ledger,
            mutator,
        }
    }

    fn check_year_month(year_month: &str) -> ApiResult<()> {
        if is_valid_year_month(year_month) {
            Ok(())
        } else {
            Err(ApiError::InvalidInput(format!(
                "年月必须为4位数字(如2601): {}",
                year_month
            )))
        }
    }

    fn require_order(&self, number: &str) -> ApiResult<Order> {
        self.order_repo
            .find_by_number(number)?
            .ok_or_else(|| ApiError::NotFound(t_with_args("order.not_found", &[("number", number)])))
    }

    // ==========================================
    // 发号
    // ==========================================

    /// 生成主单号（占用计数器序号）
    pub fn mint_main_number(&self, year_month: &str, category: Category) -> ApiResult<String> {
        Self::check_year_month(year_month)?;
        Ok(self.generator.mint_main_number(year_month, category)?)
    }

    /// 生成下一个明细号（max+1，不占号）
    pub fn mint_detail_number(&self, year_month: &str, category: Category) -> ApiResult<String> {
        Self::check_year_month(year_month)?;
        Ok(self.generator.mint_detail_number(year_month, category)?)
    }

    // ==========================================
    // 主单
    // ==========================================

    /// 新建主单：发号与写入在同一事务内
    pub fn create_order(&self, new_order: &NewOrder) -> ApiResult<Order> {
        Self::check_year_month(&new_order.year_month)?;

        let order = {
            let mut conn = self
                .conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            let tx = conn.transaction().map_err(RepositoryError::from)?;
            let seq = CounterRepository::next_in_tx(&tx, &new_order.year_month, new_order.category)?;
            let order = Order {
                number: format_main_number(&new_order.year_month, new_order.category, seq),
                year_month: new_order.year_month.clone(),
                category: new_order.category,
                unit: new_order.unit.clone(),
                date: new_order.date,
                task_name: new_order.task_name.clone(),
            };
            OrderRepository::upsert_in(&tx, &order)?;
            tx.commit().map_err(RepositoryError::from)?;
            order
        };

        tracing::info!(order_number = order.number.as_str(), "新建采购计划");
        Ok(order)
    }

    /// 保存主单（单号已提前生成时使用，同号覆盖）
    pub fn save_order(&self, order: &Order) -> ApiResult<()> {
        Self::check_year_month(&order.year_month)?;
        if order.number.trim().is_empty() {
            return Err(ApiError::InvalidInput("单号不能为空".to_string()));
        }
        self.order_repo.insert_or_replace(order)?;
        Ok(())
    }

    pub fn find_order(&self, number: &str) -> ApiResult<Order> {
        self.require_order(number)
    }

    pub fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<Order>> {
        Ok(self.order_repo.list(filter)?)
    }

    pub fn update_order_date(&self, number: &str, date: NaiveDate) -> ApiResult<bool> {
        Ok(self.order_repo.update_date(number, date)?)
    }

    /// 修改任务名/单位/类别/年月；类别或年月变化时重新发号并级联
    pub fn update_order_identity(
        &self,
        number: &str,
        update: &OrderIdentityUpdate,
        operator: &str,
    ) -> ApiResult<IdentityChangeOutcome> {
        Self::check_year_month(&update.year_month)?;
        Ok(self.mutator.apply(number, update, operator)?)
    }

    pub fn operation_logs(&self, number: &str) -> ApiResult<Vec<OperationLog>> {
        Ok(self.op_log_repo.find_by_order(number)?)
    }

    /// 单据汇总状态（未发放 / 已发放）
    pub fn processing_status(&self, number: &str) -> ApiResult<OrderProcessingStatus> {
        Ok(self.release_repo.processing_status(number)?)
    }

    // ==========================================
    // 明细
    // ==========================================

    /// 整单保存明细（替换 + 发放分组同步）
    ///
    /// 同一单号不可并发保存，否则后提交者覆盖先提交者
    pub fn save_details(&self, order_number: &str, entries: &[DetailEntry]) -> ApiResult<LedgerSaveOutcome> {
        self.require_order(order_number)?;
        Ok(self.ledger.save_full_set(order_number, entries)?)
    }

    pub fn validate_sequence(&self, order_number: &str) -> ApiResult<SequenceReport> {
        Ok(self.ledger.validate(order_number)?)
    }

    /// 录入视图（大号在前）
    pub fn entry_details(&self, order_number: &str) -> ApiResult<Vec<DetailLine>> {
        Ok(self.ledger.entry_view(order_number)?)
    }

    /// 导出视图（小号在前）
    pub fn export_details(&self, order_number: &str) -> ApiResult<Vec<DetailLine>> {
        Ok(self.ledger.ascending_view(order_number)?)
    }

    pub fn count_details(&self, order_number: &str) -> ApiResult<i64> {
        Ok(self.detail_repo.count_by_order(order_number)?)
    }

    pub fn order_inquiry_total(&self, order_number: &str) -> ApiResult<f64> {
        Ok(self.detail_repo.inquiry_total(order_number)?)
    }

    /// 刷新明细序号诊断缓存
    pub fn recalc_detail_counter(&self, year_month: &str, category: Category) -> ApiResult<i64> {
        Self::check_year_month(year_month)?;
        Ok(self.counter_repo.recalc_detail_counter(year_month, category)?)
    }

    /// 清空测试数据（明细、主单、计数器、发放分组）
    pub fn reset_test_data(&self) -> ApiResult<()> {
        Ok(self.order_repo.reset_all_test_data()?)
    }
}
