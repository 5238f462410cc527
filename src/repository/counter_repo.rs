// ==========================================
// 采购计划管理系统 - 计数器仓储
// ==========================================
// counter: 主单号序号，只增不减，读-增-写在同一事务内完成
// detail_counter: 明细最大序号缓存，仅供诊断，发号时不读取
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::types::Category;
use crate::engine::identifier::{detail_prefix, max_suffix};
use crate::engine::numbering::CounterStore;
use crate::repository::detail_repo::DetailRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct CounterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CounterRepository {
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

    /// 在调用方事务内占用下一个主单序号（首次使用时为 1）
    pub fn next_in_tx(conn: &Connection, year_month: &str, category: Category) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT INTO counter (yymm, category, seq) VALUES (?1, ?2, 1)
            ON CONFLICT(yymm, category) DO UPDATE SET seq = seq + 1
            "#,
            params![year_month, category.code()],
        )?;
        let seq: i64 = conn.query_row(
            "SELECT seq FROM counter WHERE yymm = ?1 AND category = ?2",
            params![year_month, category.code()],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// 独立事务中占用下一个主单序号
    pub fn next_main_sequence(&self, year_month: &str, category: Category) -> RepositoryResult<i64> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let seq = Self::next_in_tx(&tx, year_month, category)?;
        tx.commit()?;
        Ok(seq)
    }

    /// 当前已发出的最大主单序号（从未发号时为 None）
    pub fn current_main_sequence(
        &self,
        year_month: &str,
        category: Category,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let seq = conn
            .query_row(
                "SELECT seq FROM counter WHERE yymm = ?1 AND category = ?2",
                params![year_month, category.code()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq)
    }

    /// 重新扫描明细，刷新某前缀的最大序号缓存
    pub fn recalc_in(conn: &Connection, year_month: &str, category: Category) -> RepositoryResult<i64> {
        let prefix = detail_prefix(year_month, category);
        let numbers = DetailRepository::detail_numbers_with_prefix_in(conn, &prefix)?;
        let max = max_suffix(numbers.iter().map(String::as_str));
        conn.execute(
            r#"
            INSERT INTO detail_counter (yymm, category, seq) VALUES (?1, ?2, ?3)
            ON CONFLICT(yymm, category) DO UPDATE SET seq = excluded.seq
            "#,
            params![year_month, category.code(), max],
        )?;
        Ok(max)
    }

    pub fn recalc_detail_counter(&self, year_month: &str, category: Category) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::recalc_in(&conn, year_month, category)
    }

    /// 读取诊断缓存
    pub fn cached_detail_max(
        &self,
        year_month: &str,
        category: Category,
    ) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let seq = conn
            .query_row(
                "SELECT seq FROM detail_counter WHERE yymm = ?1 AND category = ?2",
                params![year_month, category.code()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq)
    }
}

impl CounterStore for CounterRepository {
    fn next_main_sequence(&self, year_month: &str, category: Category) -> RepositoryResult<i64> {
        CounterRepository::next_main_sequence(self, year_month, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn repo() -> CounterRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        CounterRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_counter_starts_at_one_and_is_per_key() {
        let repo = repo();
        assert_eq!(repo.next_main_sequence("2601", Category::Civil).unwrap(), 1);
        assert_eq!(repo.next_main_sequence("2601", Category::Civil).unwrap(), 2);
        assert_eq!(repo.next_main_sequence("2601", Category::Machined).unwrap(), 1);
        assert_eq!(
            repo.current_main_sequence("2601", Category::Civil).unwrap(),
            Some(2)
        );
        assert_eq!(repo.current_main_sequence("2602", Category::Civil).unwrap(), None);
    }

    #[test]
    fn test_recalc_detail_counter_ignores_other_prefixes() {
        let repo = repo();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute_batch(
                r#"
                INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MP0001', '2601MP-4');
                INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MP0001', '2601MP-x');
                INSERT INTO order_details (order_number, detail_no) VALUES ('CG-2601MPJ0001', '2601MPJ-9');
                "#,
            )
            .unwrap();
        }
        assert_eq!(repo.recalc_detail_counter("2601", Category::Civil).unwrap(), 4);
        assert_eq!(repo.cached_detail_max("2601", Category::Civil).unwrap(), Some(4));
    }
}
