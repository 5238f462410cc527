// ==========================================
// 采购计划管理系统 - 月度计划仓储
// ==========================================
// 执行情况 = 当月主单下明细，按 TRIM(标的名称)+TRIM(规格型号) 关联
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::monthly_plan::{MonthlyPlan, MonthlyPlanExecution};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const INSERT_SQL: &str = r#"
    INSERT INTO monthly_plans (plan_month, item_name, spec_model, unit, plan_qty, plan_budget, department, remarks)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub struct MonthlyPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MonthlyPlanRepository {
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

    /// 保存：无 id 新增，有 id 更新；返回记录 id
    pub fn save(&self, plan: &MonthlyPlan) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        match plan.id {
            Some(id) => {
                let changed = conn.execute(
                    r#"
                    UPDATE monthly_plans
                    SET plan_month = ?1, item_name = ?2, spec_model = ?3, unit = ?4,
                        plan_qty = ?5, plan_budget = ?6, department = ?7, remarks = ?8
                    WHERE id = ?9
                    "#,
                    params![
                        plan.plan_month,
                        plan.item_name,
                        plan.spec_model,
                        plan.unit,
                        plan.plan_qty,
                        plan.plan_budget,
                        plan.department,
                        plan.remarks,
                        id,
                    ],
                )?;
                if changed == 0 {
                    return Err(RepositoryError::not_found("MonthlyPlan", id.to_string()));
                }
                Ok(id)
            }
            None => {
                conn.execute(
                    INSERT_SQL,
                    params![
                        plan.plan_month,
                        plan.item_name,
                        plan.spec_model,
                        plan.unit,
                        plan.plan_qty,
                        plan.plan_budget,
                        plan.department,
                        plan.remarks,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute("DELETE FROM monthly_plans WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// 批量导入（同一事务）
    pub fn import_rows(&self, plans: &[MonthlyPlan]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(INSERT_SQL)?;
            for plan in plans {
                stmt.execute(params![
                    plan.plan_month,
                    plan.item_name,
                    plan.spec_model,
                    plan.unit,
                    plan.plan_qty,
                    plan.plan_budget,
                    plan.department,
                    plan.remarks,
                ])?;
            }
        }
        tx.commit()?;
        Ok(plans.len())
    }

    /// 某月计划及执行数量/金额
    pub fn list_with_execution(&self, plan_month: &str) -> RepositoryResult<Vec<MonthlyPlanExecution>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                mp.id, mp.plan_month, mp.item_name, mp.spec_model, mp.unit,
                mp.plan_qty, mp.plan_budget, mp.department, mp.remarks,
                COALESCE(sub.exec_qty, 0),
                COALESCE(sub.exec_amt, 0)
            FROM monthly_plans mp
            LEFT JOIN (
                SELECT
                    TRIM(od.purchase_item) AS item_name,
                    TRIM(IFNULL(od.spec_model, '')) AS spec_model,
                    SUM(CAST(REPLACE(IFNULL(od.purchase_qty, '0'), ',', '') AS REAL)) AS exec_qty,
                    SUM(CAST(REPLACE(IFNULL(od.inquiry_price, '0'), ',', '') AS REAL)) AS exec_amt
                FROM order_details od
                JOIN orders o ON od.order_number = o.number
                WHERE o.yymm = ?1
                GROUP BY TRIM(od.purchase_item), TRIM(IFNULL(od.spec_model, ''))
            ) sub ON TRIM(mp.item_name) = sub.item_name AND TRIM(IFNULL(mp.spec_model, '')) = sub.spec_model
            WHERE mp.plan_month = ?1
            ORDER BY mp.id
            "#,
        )?;
        let rows = stmt
            .query_map(params![plan_month], |row| {
                Ok(MonthlyPlanExecution {
                    plan: MonthlyPlan {
                        id: row.get(0)?,
                        plan_month: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        item_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        spec_model: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                        unit: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        plan_qty: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                        plan_budget: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                        department: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                        remarks: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    },
                    executed_qty: row.get(9)?,
                    executed_amount: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
