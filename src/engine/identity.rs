// ==========================================
// 采购计划管理系统 - 主单身份变更
// ==========================================
// 月份/类别未变: 原地更新任务名、单位，单号不变
// 月份或类别变化: 重新发号 → 主单改号 → 级联发放分组与明细 → 明细号换前缀保留后缀
// 红线: 以上在同一事务内完成；提交后再尽力刷新明细序号缓存（失败只记日志）
// ==========================================

use crate::domain::monthly_plan::OperationLog;
use crate::domain::order::{IdentityChangeOutcome, Order, OrderIdentityUpdate};
use crate::domain::types::{Category, IdentityChangeMode};
use crate::engine::identifier::{detail_prefix, format_main_number, is_valid_year_month};
use crate::i18n::{t, t_with_args};
use crate::repository::counter_repo::CounterRepository;
use crate::repository::detail_repo::DetailRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::operation_log_repo::OperationLogRepository;
use crate::repository::order_repo::OrderRepository;
use crate::repository::release_repo::ReleaseGroupRepository;
use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 判断变更类型
pub fn classify_identity_change(current: &Order, update: &OrderIdentityUpdate) -> IdentityChangeMode {
    if current.category == update.category && current.year_month == update.year_month {
        IdentityChangeMode::Simple
    } else {
        IdentityChangeMode::Regenerate
    }
}

pub struct OrderIdentityMutator {
    conn: Arc<Mutex<Connection>>,
    counter: CounterRepository,
}

impl OrderIdentityMutator {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            counter: CounterRepository::from_connection(conn.clone()),
            conn,
        }
    }

    /// 修改主单信息；单号不存在返回 NotFound，事务失败时原单保持不变
    pub fn apply(
        &self,
        number: &str,
        update: &OrderIdentityUpdate,
        operator: &str,
    ) -> RepositoryResult<IdentityChangeOutcome> {
        let (outcome, old_key) = self.apply_in_transaction(number, update, operator)?;

        if let Some((old_year_month, old_category)) = old_key {
            self.refresh_detail_cache(&update.year_month, update.category);
            self.refresh_detail_cache(&old_year_month, old_category);
        }
        Ok(outcome)
    }

    fn apply_in_transaction(
        &self,
        number: &str,
        update: &OrderIdentityUpdate,
        operator: &str,
    ) -> RepositoryResult<(IdentityChangeOutcome, Option<(String, Category)>)> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        let current = OrderRepository::find_in(&tx, number)?
            .ok_or_else(|| RepositoryError::not_found("Order", number))?;
        let now = Local::now().naive_local();

        match classify_identity_change(&current, update) {
            IdentityChangeMode::Simple => {
                OrderRepository::update_simple_in(&tx, number, &update.task_name, &update.unit)?;
                write_field_logs(&tx, number, &current, update, operator, now)?;
                tx.commit()?;

                tracing::info!(order_number = number, "主单信息已更新");
                let outcome = IdentityChangeOutcome {
                    mode: IdentityChangeMode::Simple,
                    old_number: number.to_string(),
                    new_number: number.to_string(),
                    renamed_details: 0,
                    message: t("order.updated"),
                };
                Ok((outcome, None))
            }
            IdentityChangeMode::Regenerate => {
                if !is_valid_year_month(&update.year_month) {
                    return Err(RepositoryError::FieldValueError {
                        field: "year_month".to_string(),
                        message: update.year_month.clone(),
                    });
                }

                let seq = CounterRepository::next_in_tx(&tx, &update.year_month, update.category)?;
                let new_number = format_main_number(&update.year_month, update.category, seq);
                let old_prefix = current.detail_prefix();
                let new_prefix = detail_prefix(&update.year_month, update.category);

                OrderRepository::renumber_in(
                    &tx,
                    number,
                    &new_number,
                    &update.year_month,
                    update.category,
                    &update.task_name,
                    &update.unit,
                )?;
                let groups = ReleaseGroupRepository::renumber_in(&tx, number, &new_number)?;
                let renamed =
                    DetailRepository::renumber_in(&tx, number, &new_number, &old_prefix, &new_prefix)?;

                OperationLogRepository::insert_in(
                    &tx,
                    &OperationLog {
                        id: None,
                        order_number: new_number.clone(),
                        field: "number".to_string(),
                        old_value: number.to_string(),
                        new_value: new_number.clone(),
                        operator: operator.to_string(),
                        op_time: now,
                    },
                )?;
                write_field_logs(&tx, &new_number, &current, update, operator, now)?;
                tx.commit()?;

                tracing::info!(
                    old_number = number,
                    new_number = new_number.as_str(),
                    release_groups = groups,
                    renamed_details = renamed,
                    "主单改号完成"
                );
                let outcome = IdentityChangeOutcome {
                    mode: IdentityChangeMode::Regenerate,
                    old_number: number.to_string(),
                    message: t_with_args("order.renumbered", &[("number", &new_number)]),
                    new_number,
                    renamed_details: renamed,
                };
                Ok((outcome, Some((current.year_month.clone(), current.category))))
            }
        }
    }

    /// 尽力刷新明细序号缓存，失败只告警
    fn refresh_detail_cache(&self, year_month: &str, category: Category) {
        if let Err(e) = self.counter.recalc_detail_counter(year_month, category) {
            tracing::warn!(
                year_month,
                category = category.code(),
                "刷新明细序号缓存失败（已忽略）: {}",
                e
            );
        }
    }
}

fn write_field_logs(
    conn: &Connection,
    order_number: &str,
    current: &Order,
    update: &OrderIdentityUpdate,
    operator: &str,
    now: NaiveDateTime,
) -> RepositoryResult<()> {
    let changes = [
        ("task_name", &current.task_name, &update.task_name),
        ("unit", &current.unit, &update.unit),
    ];
    for (field, old, new) in changes {
        if old != new {
            OperationLogRepository::insert_in(
                conn,
                &OperationLog {
                    id: None,
                    order_number: order_number.to_string(),
                    field: field.to_string(),
                    old_value: old.clone(),
                    new_value: new.clone(),
                    operator: operator.to_string(),
                    op_time: now,
                },
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order() -> Order {
        Order {
            number: "CG-2601MP0007".to_string(),
            year_month: "2601".to_string(),
            category: Category::Civil,
            unit: "生产部".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            task_name: "任务".to_string(),
        }
    }

    fn update(category: Category, year_month: &str) -> OrderIdentityUpdate {
        OrderIdentityUpdate {
            task_name: "新任务".to_string(),
            unit: "采购部".to_string(),
            category,
            year_month: year_month.to_string(),
        }
    }

    #[test]
    fn test_classify_identity_change() {
        assert_eq!(
            classify_identity_change(&order(), &update(Category::Civil, "2601")),
            IdentityChangeMode::Simple
        );
        assert_eq!(
            classify_identity_change(&order(), &update(Category::Machined, "2601")),
            IdentityChangeMode::Regenerate
        );
        assert_eq!(
            classify_identity_change(&order(), &update(Category::Civil, "2602")),
            IdentityChangeMode::Regenerate
        );
    }
}
