// ==========================================
// 采购计划管理系统 - 操作日志仓储
// ==========================================
// 职责: 记录主单字段变更（审计）
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::monthly_plan::OperationLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct OperationLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperationLogRepository {
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

    pub fn insert_in(conn: &Connection, log: &OperationLog) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT INTO operation_logs (order_number, field, old_value, new_value, operator, op_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                log.order_number,
                log.field,
                log.old_value,
                log.new_value,
                log.operator,
                log.op_time.format(TIME_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert(&self, log: &OperationLog) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, log)
    }

    /// 某单号的变更记录（按写入顺序）
    pub fn find_by_order(&self, order_number: &str) -> RepositoryResult<Vec<OperationLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_number, field, old_value, new_value, operator, op_time
            FROM operation_logs
            WHERE order_number = ?1
            ORDER BY id
            "#,
        )?;
        let logs = stmt
            .query_map(params![order_number], |row| {
                let op_time: String = row.get::<_, Option<String>>(6)?.unwrap_or_default();
                Ok(OperationLog {
                    id: row.get(0)?,
                    order_number: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    field: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    old_value: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    new_value: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    operator: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    op_time: NaiveDateTime::parse_from_str(&op_time, TIME_FORMAT)
                        .unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
