// ==========================================
// 采购计划管理系统 - 采购明细仓储
// ==========================================
// 红线: 明细只能整单替换（先删后插），没有单行删除接口
// 红线: 读取按列名映射为 DetailFields，禁止按序号取值
// ==========================================

use crate::db::open_shared_connection;
use crate::domain::detail::{DetailEntry, DetailFields, DetailLine};
use crate::engine::identifier::{rewrite_detail_prefix, sort_by_detail_suffix, SuffixOrder};
use crate::engine::money::parse_amount;
use crate::engine::numbering::DetailNumberSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// order_details 业务列（与 DetailFields 字段一一对应）
const FIELD_COLUMNS: &str = "item_name, purchase_item, spec_model, purchase_cycle, stock_count, \
     purchase_qty, unit, unit_price, budget_wan, purchase_method, purchase_channel, plan_time, \
     demand_unit, plan_release, progress_req, supplier, inquiry_price, tax_rate, actual_status, \
     purchase_body, add_adjust, remark";

fn text(row: &Row<'_>, name: &str) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(name)?.unwrap_or_default())
}

fn map_fields(row: &Row<'_>) -> rusqlite::Result<DetailFields> {
    Ok(DetailFields {
        item_name: text(row, "item_name")?,
        purchase_item: text(row, "purchase_item")?,
        spec_model: text(row, "spec_model")?,
        purchase_cycle: text(row, "purchase_cycle")?,
        stock_count: text(row, "stock_count")?,
        quantity: text(row, "purchase_qty")?,
        unit: text(row, "unit")?,
        unit_price: text(row, "unit_price")?,
        budget: text(row, "budget_wan")?,
        purchase_method: text(row, "purchase_method")?,
        purchase_channel: text(row, "purchase_channel")?,
        plan_time: text(row, "plan_time")?,
        demand_unit: text(row, "demand_unit")?,
        plan_release: text(row, "plan_release")?,
        progress_req: text(row, "progress_req")?,
        supplier: text(row, "supplier")?,
        inquiry_price: text(row, "inquiry_price")?,
        tax_rate: text(row, "tax_rate")?,
        actual_status: text(row, "actual_status")?,
        purchase_body: text(row, "purchase_body")?,
        add_adjust: text(row, "add_adjust")?,
        remark: text(row, "remark")?,
    })
}

fn map_line(row: &Row<'_>) -> rusqlite::Result<DetailLine> {
    Ok(DetailLine {
        id: row.get("id")?,
        order_number: text(row, "order_number")?,
        detail_no: text(row, "detail_no")?,
        fields: map_fields(row)?,
    })
}

// ==========================================
// DetailRepository - 明细仓储
// ==========================================
pub struct DetailRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DetailRepository {
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

    /// 整单替换（须在调用方事务内执行），返回写入行数
    pub fn replace_in_tx(
        conn: &Connection,
        order_number: &str,
        entries: &[DetailEntry],
    ) -> RepositoryResult<usize> {
        conn.execute(
            "DELETE FROM order_details WHERE order_number = ?1",
            params![order_number],
        )?;

        let sql = format!(
            "INSERT INTO order_details (order_number, detail_no, {}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            FIELD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        for entry in entries {
            let f = &entry.fields;
            stmt.execute(params![
                order_number,
                entry.detail_no,
                f.item_name,
                f.purchase_item,
                f.spec_model,
                f.purchase_cycle,
                f.stock_count,
                f.quantity,
                f.unit,
                f.unit_price,
                f.budget,
                f.purchase_method,
                f.purchase_channel,
                f.plan_time,
                f.demand_unit,
                f.plan_release,
                f.progress_req,
                f.supplier,
                f.inquiry_price,
                f.tax_rate,
                f.actual_status,
                f.purchase_body,
                f.add_adjust,
                f.remark,
            ])?;
        }
        Ok(entries.len())
    }

    /// 按入库顺序读取某单全部明细
    pub fn find_in(conn: &Connection, order_number: &str) -> RepositoryResult<Vec<DetailLine>> {
        let sql = format!(
            "SELECT id, order_number, detail_no, {} FROM order_details WHERE order_number = ?1 ORDER BY id",
            FIELD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let lines = stmt
            .query_map(params![order_number], map_line)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    /// 按序号排序读取某单明细
    pub fn find_by_order_sorted(
        &self,
        order_number: &str,
        order: SuffixOrder,
    ) -> RepositoryResult<Vec<DetailLine>> {
        let conn = self.get_conn()?;
        let mut lines = Self::find_in(&conn, order_number)?;
        sort_by_detail_suffix(&mut lines, order, |l| l.detail_no.as_str());
        Ok(lines)
    }

    /// 录入视图：大号在前
    pub fn find_entry_view(&self, order_number: &str) -> RepositoryResult<Vec<DetailLine>> {
        self.find_by_order_sorted(order_number, SuffixOrder::Descending)
    }

    /// 发放视图：某采购员的明细，小号在前
    pub fn find_release_view(
        &self,
        order_number: &str,
        purchaser: &str,
    ) -> RepositoryResult<Vec<DetailLine>> {
        let mut lines = self.find_by_order_sorted(order_number, SuffixOrder::Ascending)?;
        lines.retain(|l| l.fields.plan_release == purchaser);
        Ok(lines)
    }

    pub fn detail_numbers_for_order(&self, order_number: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT detail_no FROM order_details WHERE order_number = ?1 ORDER BY id")?;
        let numbers = stmt
            .query_map(params![order_number], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(numbers.into_iter().flatten().collect())
    }

    /// 全库中以给定前缀开头的明细号（前缀按字面比较，'_' 不作通配）
    pub fn detail_numbers_with_prefix_in(
        conn: &Connection,
        prefix: &str,
    ) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT detail_no FROM order_details WHERE substr(detail_no, 1, length(?1)) = ?1",
        )?;
        let numbers = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(numbers)
    }

    pub fn detail_numbers_with_prefix(&self, prefix: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        Self::detail_numbers_with_prefix_in(&conn, prefix)
    }

    pub fn count_by_order(&self, order_number: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(1) FROM order_details WHERE order_number = ?1",
            params![order_number],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 询价金额合计（去千分位，无法解析的值忽略）
    pub fn inquiry_total(&self, order_number: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT inquiry_price FROM order_details WHERE order_number = ?1")?;
        let values = stmt
            .query_map(params![order_number], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values
            .iter()
            .flatten()
            .filter_map(|v| parse_amount(v))
            .sum())
    }

    /// 改号级联：明细归属单号与明细号前缀一并替换，返回重命名的明细号数量
    pub fn renumber_in(
        conn: &Connection,
        old_number: &str,
        new_number: &str,
        old_prefix: &str,
        new_prefix: &str,
    ) -> RepositoryResult<usize> {
        conn.execute(
            "UPDATE order_details SET order_number = ?1 WHERE order_number = ?2",
            params![new_number, old_number],
        )?;

        let rows: Vec<(i64, String)> = {
            let mut stmt = conn.prepare(
                "SELECT id, detail_no FROM order_details WHERE order_number = ?1 ORDER BY id",
            )?;
            let collected = stmt
                .query_map(params![new_number], |row| {
                    Ok((row.get(0)?, row.get::<_, Option<String>>(1)?.unwrap_or_default()))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            collected
        };

        let mut renamed = 0;
        for (id, detail_no) in rows {
            if let Some(new_no) = rewrite_detail_prefix(&detail_no, old_prefix, new_prefix) {
                conn.execute(
                    "UPDATE order_details SET detail_no = ?1 WHERE id = ?2",
                    params![new_no, id],
                )?;
                renamed += 1;
            }
        }
        Ok(renamed)
    }
}

impl DetailNumberSource for DetailRepository {
    fn detail_numbers_with_prefix(&self, prefix: &str) -> RepositoryResult<Vec<String>> {
        DetailRepository::detail_numbers_with_prefix(self, prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn setup() -> (Arc<Mutex<Connection>>, DetailRepository) {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        (shared.clone(), DetailRepository::from_connection(shared))
    }

    fn entry(no: &str, purchaser: &str, inquiry: &str) -> DetailEntry {
        DetailEntry::new(
            no,
            DetailFields {
                purchase_item: format!("标的{}", no),
                plan_release: purchaser.to_string(),
                inquiry_price: inquiry.to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_replace_drops_omitted_lines() {
        let (shared, repo) = setup();
        {
            let conn = shared.lock().unwrap();
            DetailRepository::replace_in_tx(
                &conn,
                "CG-2601MP0001",
                &[entry("2601MP-1", "A", ""), entry("2601MP-2", "B", "")],
            )
            .unwrap();
            DetailRepository::replace_in_tx(&conn, "CG-2601MP0001", &[entry("2601MP-2", "B", "")])
                .unwrap();
        }
        assert_eq!(repo.count_by_order("CG-2601MP0001").unwrap(), 1);
        assert_eq!(
            repo.detail_numbers_for_order("CG-2601MP0001").unwrap(),
            vec!["2601MP-2".to_string()]
        );
    }

    #[test]
    fn test_views_sort_in_opposite_directions() {
        let (shared, repo) = setup();
        {
            let conn = shared.lock().unwrap();
            DetailRepository::replace_in_tx(
                &conn,
                "CG-2601MP0001",
                &[
                    entry("2601MP-2", "A", ""),
                    entry("2601MP-10", "A", ""),
                    entry("2601MP-1", "B", ""),
                ],
            )
            .unwrap();
        }
        let entry_view: Vec<String> = repo
            .find_entry_view("CG-2601MP0001")
            .unwrap()
            .into_iter()
            .map(|l| l.detail_no)
            .collect();
        assert_eq!(entry_view, vec!["2601MP-10", "2601MP-2", "2601MP-1"]);

        let release_view: Vec<String> = repo
            .find_release_view("CG-2601MP0001", "A")
            .unwrap()
            .into_iter()
            .map(|l| l.detail_no)
            .collect();
        assert_eq!(release_view, vec!["2601MP-2", "2601MP-10"]);
    }

    #[test]
    fn test_prefix_scan_treats_underscore_literally() {
        let (shared, repo) = setup();
        {
            let conn = shared.lock().unwrap();
            DetailRepository::replace_in_tx(
                &conn,
                "CG-2601MPB_WX0001",
                &[entry("2601MPB_WX-3", "", ""), entry("2601MPBXWX-8", "", "")],
            )
            .unwrap();
        }
        assert_eq!(
            repo.detail_numbers_with_prefix("2601MPB_WX-").unwrap(),
            vec!["2601MPB_WX-3".to_string()]
        );
    }

    #[test]
    fn test_inquiry_total_strips_separators_and_ignores_junk() {
        let (shared, repo) = setup();
        {
            let conn = shared.lock().unwrap();
            DetailRepository::replace_in_tx(
                &conn,
                "CG-2601MP0001",
                &[
                    entry("2601MP-1", "", "1,200.50"),
                    entry("2601MP-2", "", "待询价"),
                    entry("2601MP-3", "", "99.5"),
                ],
            )
            .unwrap();
        }
        let total = repo.inquiry_total("CG-2601MP0001").unwrap();
        assert!((total - 1300.0).abs() < 1e-9);
    }
}
