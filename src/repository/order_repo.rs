// ==========================================
// 采购计划管理系统 - 主单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::order::{Order, OrderFilter};
use crate::domain::types::Category;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = "number, yymm, category, unit, date, task_name";

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn map_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        number: row.get(0)?,
        year_month: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        category: Category::from_code(&row.get::<_, Option<String>>(2)?.unwrap_or_default()),
        unit: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        date: row
            .get::<_, Option<String>>(4)?
            .and_then(|s| parse_date(&s))
            .unwrap_or_default(),
        task_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}

// ==========================================
// OrderRepository - 主单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
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

    /// 写入主单（同号覆盖）
    pub fn upsert_in(conn: &Connection, order: &Order) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO orders (number, yymm, category, unit, date, task_name)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                order.number,
                order.year_month,
                order.category.code(),
                order.unit,
                order.date.format("%Y-%m-%d").to_string(),
                order.task_name,
            ],
        )?;
        Ok(())
    }

    pub fn insert_or_replace(&self, order: &Order) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert_in(&conn, order)
    }

    pub fn find_in(conn: &Connection, number: &str) -> RepositoryResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE number = ?1", ORDER_COLUMNS);
        let order = conn.query_row(&sql, params![number], map_order).optional()?;
        Ok(order)
    }

    pub fn find_by_number(&self, number: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        Self::find_in(&conn, number)
    }

    /// 主单列表（子串过滤，最新在前）
    pub fn list(&self, filter: &OrderFilter) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let conditions = [
            ("number LIKE ?", &filter.number),
            ("task_name LIKE ?", &filter.task_name),
            ("unit LIKE ?", &filter.unit),
            ("yymm LIKE ?", &filter.year_month),
        ];
        for (clause, value) in conditions {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                clauses.push(clause);
                values.push(format!("%{}%", v));
            }
        }

        let mut sql = format!("SELECT {} FROM orders", ORDER_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY rowid DESC");

        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values.iter()), map_order)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// 修改编制日期，返回是否有行被更新
    pub fn update_date(&self, number: &str, date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE orders SET date = ?1 WHERE number = ?2",
            params![date.format("%Y-%m-%d").to_string(), number],
        )?;
        Ok(changed > 0)
    }

    /// 只改任务名与单位
    pub fn update_simple_in(
        conn: &Connection,
        number: &str,
        task_name: &str,
        unit: &str,
    ) -> RepositoryResult<usize> {
        let changed = conn.execute(
            "UPDATE orders SET task_name = ?1, unit = ?2 WHERE number = ?3",
            params![task_name, unit, number],
        )?;
        Ok(changed)
    }

    /// 主单改号并更新分类字段
    pub fn renumber_in(
        conn: &Connection,
        old_number: &str,
        new_number: &str,
        year_month: &str,
        category: Category,
        task_name: &str,
        unit: &str,
    ) -> RepositoryResult<usize> {
        let changed = conn.execute(
            r#"
            UPDATE orders
            SET number = ?1, yymm = ?2, category = ?3, task_name = ?4, unit = ?5
            WHERE number = ?6
            "#,
            params![new_number, year_month, category.code(), task_name, unit, old_number],
        )?;
        Ok(changed)
    }

    /// 清空业务数据（明细、主单、计数器、发放分组），字典与推荐库保留
    pub fn reset_all_test_data(&self) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM order_details;
            DELETE FROM orders;
            DELETE FROM counter;
            DELETE FROM detail_counter;
            DELETE FROM release_orders;
            "#,
        )?;
        tx.commit()?;
        tracing::warn!("已清空测试数据");
        Ok(())
    }
}
