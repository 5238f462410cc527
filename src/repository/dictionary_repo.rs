// ==========================================
// 采购计划管理系统 - 基础字典仓储
// ==========================================
// 单位 / 采购员 / 采购状态 / 计划月份，四张单列表结构相同
// ==========================================

use crate::db::open_shared_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryKind {
    Unit,
    Purchaser,
    PurchaseStatus,
    PlanMonth,
}

impl DictionaryKind {
    /// 表名只来自本枚举，可安全拼接进 SQL
    pub fn table(&self) -> &'static str {
        match self {
            DictionaryKind::Unit => "units",
            DictionaryKind::Purchaser => "purchasers",
            DictionaryKind::PurchaseStatus => "purchase_status",
            DictionaryKind::PlanMonth => "plan_months",
        }
    }
}

pub struct DictionaryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DictionaryRepository {
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

    pub fn list(&self, kind: DictionaryKind) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT name FROM {} ORDER BY rowid", kind.table());
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// 新增（去空白；空值或已存在返回 false）
    pub fn add(&self, kind: DictionaryKind, name: &str) -> RepositoryResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        let conn = self.get_conn()?;
        let sql = format!("INSERT OR IGNORE INTO {}(name) VALUES(?1)", kind.table());
        let changed = conn.execute(&sql, params![name])?;
        Ok(changed > 0)
    }

    /// 重命名（新旧名均非空且不同，且新名不存在时才执行）
    pub fn rename(&self, kind: DictionaryKind, old_name: &str, new_name: &str) -> RepositoryResult<bool> {
        let old_name = old_name.trim();
        let new_name = new_name.trim();
        if old_name.is_empty() || new_name.is_empty() || old_name == new_name {
            return Ok(false);
        }
        let conn = self.get_conn()?;
        let exists_sql = format!("SELECT 1 FROM {} WHERE name = ?1", kind.table());
        let exists = conn
            .query_row(&exists_sql, params![new_name], |_row| Ok(()))
            .optional()?
            .is_some();
        if exists {
            return Ok(false);
        }
        let sql = format!("UPDATE {} SET name = ?1 WHERE name = ?2", kind.table());
        let changed = conn.execute(&sql, params![new_name, old_name])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn repo() -> DictionaryRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        DictionaryRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_seeded_units_and_statuses() {
        let repo = repo();
        assert_eq!(
            repo.list(DictionaryKind::Unit).unwrap(),
            vec!["生产部", "采购部", "仓储部"]
        );
        assert!(repo.list(DictionaryKind::Purchaser).unwrap().is_empty());
        assert_eq!(repo.list(DictionaryKind::PurchaseStatus).unwrap().len(), 4);
    }

    #[test]
    fn test_add_and_rename_rules() {
        let repo = repo();
        assert!(repo.add(DictionaryKind::Purchaser, " 张三 ").unwrap());
        assert!(!repo.add(DictionaryKind::Purchaser, "张三").unwrap());
        assert!(!repo.add(DictionaryKind::Purchaser, "   ").unwrap());
        assert!(repo.add(DictionaryKind::Purchaser, "李四").unwrap());

        assert!(!repo.rename(DictionaryKind::Purchaser, "张三", "李四").unwrap());
        assert!(!repo.rename(DictionaryKind::Purchaser, "张三", "张三").unwrap());
        assert!(repo.rename(DictionaryKind::Purchaser, "张三", "王五").unwrap());
        assert_eq!(
            repo.list(DictionaryKind::Purchaser).unwrap(),
            vec!["王五", "李四"]
        );
    }
}
