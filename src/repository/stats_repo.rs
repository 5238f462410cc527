// ==========================================
// 采购计划管理系统 - 统计与导出数据仓储
// ==========================================
// 只提供数字与有序行，不负责格式化/排版
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::monthly_plan::{MonthlyExportRow, WorkbenchStats};
use crate::domain::types::Category;
use crate::engine::identifier::{compare_detail_numbers, SuffixOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex};

/// 询价金额文本转数值（去千分位）
const AMOUNT_EXPR: &str = "CAST(REPLACE(IFNULL(d.inquiry_price, '0'), ',', '') AS REAL)";

pub struct StatsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StatsRepository {
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

    /// 工作台统计（year_month 为空表示全部）
    pub fn workbench_stats(&self, year_month: Option<&str>) -> RepositoryResult<WorkbenchStats> {
        let conn = self.get_conn()?;
        let ym: Vec<&str> = year_month
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect();

        let mut sql = String::from(
            r#"
            SELECT
                COUNT(1),
                IFNULL(SUM(CASE WHEN category NOT IN ('MPJ', 'MPB') THEN 1 ELSE 0 END), 0),
                IFNULL(SUM(CASE WHEN category = 'MPJ' THEN 1 ELSE 0 END), 0),
                IFNULL(SUM(CASE WHEN category = 'MPB' THEN 1 ELSE 0 END), 0)
            FROM orders
            "#,
        );
        if !ym.is_empty() {
            sql.push_str(" WHERE yymm = ?1");
        }
        let (total_plans, civil_count, machined_count, semi_count): (i64, i64, i64, i64) = conn
            .query_row(&sql, params_from_iter(ym.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;

        let mut sql = String::from(
            r#"
            SELECT COUNT(DISTINCT r.source_order_number)
            FROM release_orders r
            JOIN orders o ON r.source_order_number = o.number
            WHERE r.status IN ('未发放', '待发放')
            "#,
        );
        if !ym.is_empty() {
            sql.push_str(" AND o.yymm = ?1");
        }
        let pending_plans: i64 =
            conn.query_row(&sql, params_from_iter(ym.iter()), |row| row.get(0))?;

        let mut sql = format!(
            r#"
            SELECT
                IFNULL(SUM({amt}), 0),
                IFNULL(SUM(CASE WHEN o.category NOT IN ('MPJ', 'MPB') THEN {amt} ELSE 0 END), 0),
                IFNULL(SUM(CASE WHEN o.category = 'MPJ' THEN {amt} ELSE 0 END), 0),
                IFNULL(SUM(CASE WHEN o.category = 'MPB' THEN {amt} ELSE 0 END), 0)
            FROM order_details d
            JOIN orders o ON d.order_number = o.number
            "#,
            amt = AMOUNT_EXPR
        );
        if !ym.is_empty() {
            sql.push_str(" WHERE o.yymm = ?1");
        }
        let (total_amount, civil_amount, machined_amount, semi_amount): (f64, f64, f64, f64) = conn
            .query_row(&sql, params_from_iter(ym.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;

        Ok(WorkbenchStats {
            total_plans,
            pending_plans,
            processed_plans: (total_plans - pending_plans).max(0),
            civil_count,
            machined_count,
            semi_count,
            total_amount,
            civil_amount,
            machined_amount,
            semi_amount,
        })
    }

    /// 月度导出行：按 类别(半成品→民品→机加件→其他) + 序号升序，无法解析的序号排最后
    pub fn monthly_export_rows(&self, year_month: &str) -> RepositoryResult<Vec<MonthlyExportRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                o.number, o.task_name, o.category, o.unit, o.date,
                d.detail_no, d.item_name, d.purchase_item, d.spec_model,
                d.unit, d.purchase_qty, d.budget_wan, d.purchase_method, d.purchase_channel,
                d.plan_release, d.inquiry_price, d.supplier, d.remark, d.plan_time
            FROM order_details d
            JOIN orders o ON d.order_number = o.number
            WHERE o.yymm = ?1
            ORDER BY d.id
            "#,
        )?;
        let mut rows = stmt
            .query_map([year_month], |row| {
                let s = |i: usize| -> rusqlite::Result<String> {
                    Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
                };
                Ok(MonthlyExportRow {
                    order_number: s(0)?,
                    task_name: s(1)?,
                    category_code: s(2)?,
                    order_unit: s(3)?,
                    order_date: s(4)?,
                    detail_no: s(5)?,
                    item_name: s(6)?,
                    purchase_item: s(7)?,
                    spec_model: s(8)?,
                    unit: s(9)?,
                    quantity: s(10)?,
                    budget: s(11)?,
                    purchase_method: s(12)?,
                    purchase_channel: s(13)?,
                    plan_release: s(14)?,
                    inquiry_price: s(15)?,
                    supplier: s(16)?,
                    remark: s(17)?,
                    plan_time: s(18)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.sort_by(|a, b| {
            Category::export_rank(&a.category_code)
                .cmp(&Category::export_rank(&b.category_code))
                .then_with(|| compare_detail_numbers(&a.detail_no, &b.detail_no, SuffixOrder::Ascending))
        });
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn repo_with(sql: &str) -> StatsRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn.execute_batch(sql).unwrap();
        StatsRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_workbench_stats_counts_pending_once_per_order() {
        let repo = repo_with(
            r#"
            INSERT INTO orders (number, yymm, category) VALUES ('CG-2601MP0001', '2601', 'MP');
            INSERT INTO orders (number, yymm, category) VALUES ('CG-2601MPJ0001', '2601', 'MPJ');
            INSERT INTO orders (number, yymm, category) VALUES ('CG-2602MPB0001', '2602', 'MPB');
            INSERT INTO release_orders (source_order_number, purchaser, status, record_count) VALUES ('CG-2601MP0001', 'A', '待发放', 1);
            INSERT INTO release_orders (source_order_number, purchaser, status, record_count) VALUES ('CG-2601MP0001', 'B', '未发放', 1);
            INSERT INTO release_orders (source_order_number, purchaser, status, record_count) VALUES ('CG-2601MPJ0001', 'A', '已发放', 1);
            INSERT INTO order_details (order_number, detail_no, inquiry_price) VALUES ('CG-2601MP0001', '2601MP-1', '1,000');
            INSERT INTO order_details (order_number, detail_no, inquiry_price) VALUES ('CG-2601MPJ0001', '2601MPJ-1', '500');
            "#,
        );

        let stats = repo.workbench_stats(Some("2601")).unwrap();
        assert_eq!(stats.total_plans, 2);
        assert_eq!(stats.pending_plans, 1);
        assert_eq!(stats.processed_plans, 1);
        assert_eq!(stats.civil_count, 1);
        assert_eq!(stats.machined_count, 1);
        assert!((stats.total_amount - 1500.0).abs() < 1e-9);
        assert!((stats.machined_amount - 500.0).abs() < 1e-9);

        assert_eq!(repo.workbench_stats(None).unwrap().total_plans, 3);
    }

    #[test]
    fn test_export_rows_sorted_by_category_rank_then_suffix() {
        let repo = repo_with(
            r#"
            INSERT INTO orders (number, yymm, category) VALUES ('CG-2601MPJ0001', '2601', 'MPJ');
            INSERT INTO orders (number, yymm, category) VALUES ('CG-2601MP0001', '2601', 'MP');
            INSERT INTO orders (number, yymm, category) VALUES ('CG-2601MPB0001', '2601', 'MPB');
            INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MPJ0001', '2601MPJ-1');
            INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MP0001', '2601MP-x');
            INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MP0001', '2601MP-2');
            INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MPB0001', '2601MPB-1');
            "#,
        );
        let order: Vec<String> = repo
            .monthly_export_rows("2601")
            .unwrap()
            .into_iter()
            .map(|r| r.detail_no)
            .collect();
        assert_eq!(order, vec!["2601MPB-1", "2601MP-2", "2601MP-x", "2601MPJ-1"]);
    }
}
