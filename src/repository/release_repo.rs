// ==========================================
// 采购计划管理系统 - 计划发放仓储
// ==========================================
// release_orders = 主单 × 采购员 的派生分组
// 同步只在明细保存的同一事务内调用（sync_in_tx）
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::release::{ReleaseFilter, ReleaseGroup, ReleaseGroupView, ReleaseSyncOutcome};
use crate::domain::types::{OrderProcessingStatus, ReleaseStatus};
use crate::engine::release_projection::{plan_release_sync, rollup_status, tally_purchasers};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_repo::parse_date;
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::{Arc, Mutex};

fn map_group(row: &Row<'_>) -> rusqlite::Result<ReleaseGroup> {
    Ok(ReleaseGroup {
        id: row.get(0)?,
        source_order_number: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        purchaser: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        release_date: row.get::<_, Option<String>>(3)?.and_then(|s| parse_date(&s)),
        status: ReleaseStatus::from_db_str(&row.get::<_, Option<String>>(4)?.unwrap_or_default()),
        record_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
    })
}

pub struct ReleaseGroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReleaseGroupRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_shared_connection(db_path)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_in(conn: &Connection, order_number: &str) -> RepositoryResult<Vec<ReleaseGroup>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, source_order_number, purchaser, release_date, status, record_count
            FROM release_orders
            WHERE source_order_number = ?1
            ORDER BY id
            "#,
        )?;
        let groups = stmt
            .query_map(params![order_number], map_group)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// 按当前明细重建某单的发放分组（须在保存明细的同一事务内）
    ///
    /// 已有分组只刷新条数；新采购员以“待发放”+ today 新建；无剩余明细的分组删除
    pub fn sync_in_tx(
        conn: &Connection,
        order_number: &str,
        today: NaiveDate,
    ) -> RepositoryResult<ReleaseSyncOutcome> {
        let purchasers: Vec<String> = {
            let mut stmt =
                conn.prepare("SELECT plan_release FROM order_details WHERE order_number = ?1")?;
            let rows = stmt
                .query_map(params![order_number], |row| row.get::<_, Option<String>>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().flatten().collect()
        };
        let tally = tally_purchasers(purchasers.iter().map(String::as_str));
        let existing = Self::find_in(conn, order_number)?;
        let plan = plan_release_sync(&existing, &tally);

        for (id, count) in &plan.updates {
            conn.execute(
                "UPDATE release_orders SET record_count = ?1 WHERE id = ?2",
                params![count, id],
            )?;
        }
        for (purchaser, count) in &plan.inserts {
            conn.execute(
                r#"
                INSERT INTO release_orders (source_order_number, purchaser, release_date, status, record_count)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    order_number,
                    purchaser,
                    today.format("%Y-%m-%d").to_string(),
                    ReleaseStatus::Pending.as_str(),
                    count,
                ],
            )?;
        }
        for id in &plan.deletes {
            conn.execute("DELETE FROM release_orders WHERE id = ?1", params![id])?;
        }

        let outcome = ReleaseSyncOutcome {
            created: plan.inserts.len(),
            updated: plan.updates.len(),
            deleted: plan.deletes.len(),
        };
        tracing::debug!(
            order_number = order_number,
            created = outcome.created,
            updated = outcome.updated,
            deleted = outcome.deleted,
            "发放分组已同步"
        );
        Ok(outcome)
    }

    pub fn find_by_order(&self, order_number: &str) -> RepositoryResult<Vec<ReleaseGroup>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, order_number)
    }

    /// 发放列表（关联主单信息，按创建顺序）
    pub fn list(&self, filter: &ReleaseFilter) -> RepositoryResult<Vec<ReleaseGroupView>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let conditions = [
            ("r.source_order_number LIKE ?", &filter.number),
            ("r.purchaser LIKE ?", &filter.purchaser),
            ("o.task_name LIKE ?", &filter.task_name),
            ("o.yymm LIKE ?", &filter.year_month),
            ("o.unit LIKE ?", &filter.unit),
        ];
        for (clause, value) in conditions {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                clauses.push(clause);
                values.push(format!("%{}%", v));
            }
        }

        let mut sql = String::from(
            r#"
            SELECT r.id, r.source_order_number, r.purchaser, r.release_date, r.status, r.record_count,
                   o.task_name, o.unit, o.yymm
            FROM release_orders r
            LEFT JOIN orders o ON o.number = r.source_order_number
            "#,
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY r.id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(ReleaseGroupView {
                    group: map_group(row)?,
                    task_name: row.get(6)?,
                    unit: row.get(7)?,
                    year_month: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 修改分组状态（分组唯一可人工编辑的字段）
    pub fn update_status(
        &self,
        order_number: &str,
        purchaser: &str,
        status: &ReleaseStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE release_orders SET status = ?1 WHERE source_order_number = ?2 AND purchaser = ?3",
            params![status.as_str(), order_number, purchaser],
        )?;
        if changed == 0 {
            return Err(RepositoryError::not_found(
                "ReleaseGroup",
                format!("{}/{}", order_number, purchaser),
            ));
        }
        Ok(())
    }

    /// 单据汇总状态
    pub fn processing_status(&self, order_number: &str) -> RepositoryResult<OrderProcessingStatus> {
        let groups = self.find_by_order(order_number)?;
        Ok(rollup_status(groups.iter().map(|g| &g.status)))
    }

    /// 改号级联
    pub fn renumber_in(conn: &Connection, old_number: &str, new_number: &str) -> RepositoryResult<usize> {
        let changed = conn.execute(
            "UPDATE release_orders SET source_order_number = ?1 WHERE source_order_number = ?2",
            params![new_number, old_number],
        )?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    #[test]
    fn test_update_status_on_missing_group_is_not_found() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let repo = ReleaseGroupRepository::from_connection(Arc::new(Mutex::new(conn)));
        let err = repo
            .update_status("CG-2601MP0001", "张三", &ReleaseStatus::Released)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_sync_keeps_status_and_date_of_existing_groups() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO order_details (order_number, detail_no, plan_release) VALUES ('CG-2601MP0001', '2601MP-1', '张三');
            INSERT INTO release_orders (source_order_number, purchaser, release_date, status, record_count)
                VALUES ('CG-2601MP0001', '张三', '2025-12-01', '已发放', 5);
            "#,
        )
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let outcome = ReleaseGroupRepository::sync_in_tx(&conn, "CG-2601MP0001", today).unwrap();
        assert_eq!(outcome.updated, 1);

        let groups = ReleaseGroupRepository::find_in(&conn, "CG-2601MP0001").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].record_count, 1);
        assert_eq!(groups[0].status, ReleaseStatus::Released);
        assert_eq!(groups[0].release_date, NaiveDate::from_ymd_opt(2025, 12, 1));
    }
}
