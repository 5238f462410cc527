// ==========================================
// 采购计划管理系统 - 推荐库仓储
// ==========================================
// 职责: 推荐规则 CRUD、历史同步候选提取、批量写入（库忙重试）、同步日志
// 红线: 批量写入只对“库忙”重试，其他错误直接计为失败
// ==========================================

use crate::db::{open_shared_connection, RetryPolicy};
use crate::domain::recommendation::{BatchInsertOutcome, RecommendationRule, ReleasedItem, SyncLog};
use crate::domain::types::ReleaseStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn map_rule(row: &Row<'_>) -> rusqlite::Result<RecommendationRule> {
    Ok(RecommendationRule {
        id: row.get(0)?,
        item_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        purchaser: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        weight: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        is_active: row.get::<_, Option<i64>>(4)?.unwrap_or(1) != 0,
        purchase_method: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        purchase_channel: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

const RULE_SELECT: &str = "SELECT id, item_name, plan_release, weight, is_active, purchase_method, purchase_channel FROM recommendations";

pub struct RecommendationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecommendationRepository {
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

    // ==========================================
    // 规则
    // ==========================================

    pub fn list_all(&self) -> RepositoryResult<Vec<RecommendationRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", RULE_SELECT))?;
        let rules = stmt
            .query_map([], map_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// 启用的规则（按 id 升序，匹配平局时先保存者优先）
    pub fn active_rules(&self) -> RepositoryResult<Vec<RecommendationRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE IFNULL(is_active, 1) = 1 ORDER BY id",
            RULE_SELECT
        ))?;
        let rules = stmt
            .query_map([], map_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// 整表替换（同一事务）
    pub fn replace_all(&self, rules: &[RecommendationRule]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM recommendations", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO recommendations (item_name, plan_release, weight, is_active, purchase_method, purchase_channel)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for rule in rules {
                stmt.execute(params![
                    rule.item_name,
                    rule.purchaser,
                    rule.weight,
                    rule.is_active as i64,
                    rule.purchase_method,
                    rule.purchase_channel,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rules.len())
    }

    pub fn existing_item_names(&self) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        Self::existing_item_names_in(&conn)
    }

    fn existing_item_names_in(conn: &Connection) -> RepositoryResult<HashSet<String>> {
        let mut stmt = conn.prepare("SELECT item_name FROM recommendations")?;
        let names = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names.into_iter().flatten().collect())
    }

    // ==========================================
    // 历史同步
    // ==========================================

    /// 已发放分组对应明细中的去重候选（空标的剔除）
    pub fn released_items_for_sync(&self) -> RepositoryResult<Vec<ReleasedItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT TRIM(IFNULL(d.purchase_item, '')),
                   TRIM(IFNULL(d.plan_release, '')),
                   TRIM(IFNULL(d.purchase_method, '')),
                   TRIM(IFNULL(d.purchase_channel, '')),
                   MIN(d.id) AS first_id
            FROM release_orders r
            JOIN order_details d
              ON d.order_number = r.source_order_number AND d.plan_release = r.purchaser
            WHERE r.status = ?1
            GROUP BY 1, 2, 3, 4
            ORDER BY first_id
            "#,
        )?;
        let items = stmt
            .query_map(params![ReleaseStatus::Released.as_str()], |row| {
                Ok(ReleasedItem {
                    purchase_item: row.get(0)?,
                    purchaser: row.get(1)?,
                    purchase_method: row.get(2)?,
                    purchase_channel: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items
            .into_iter()
            .filter(|item| !item.purchase_item.is_empty())
            .collect())
    }

    /// 写入一批候选：库中已有或本批重复的标的计为跳过
    ///
    /// 库忙时按 policy 退避重试；耗尽后整批计为失败并带上错误文本
    pub fn insert_batch(
        &self,
        items: &[ReleasedItem],
        weight: i64,
        policy: &RetryPolicy,
    ) -> BatchInsertOutcome {
        let mut outcome = BatchInsertOutcome::default();

        let existing = match self.existing_item_names() {
            Ok(names) => names,
            Err(e) => {
                outcome.failed = items.len();
                outcome.failures.push(e.to_string());
                return outcome;
            }
        };

        let mut seen: HashSet<&str> = HashSet::new();
        let mut to_insert: Vec<&ReleasedItem> = Vec::new();
        for item in items {
            let name = item.purchase_item.as_str();
            if existing.contains(name) || !seen.insert(name) {
                outcome.skipped += 1;
            } else {
                to_insert.push(item);
            }
        }
        if to_insert.is_empty() {
            return outcome;
        }

        let mut attempt = 0;
        loop {
            match self.try_insert(&to_insert, weight) {
                Ok(n) => {
                    outcome.inserted += n;
                    return outcome;
                }
                Err(e) if e.is_busy() && attempt < policy.max_retries => {
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "推荐库写入遇到数据库繁忙，稍后重试: {}",
                        e
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => {
                    tracing::warn!("推荐库批量写入失败: {}", e);
                    outcome.failed += to_insert.len();
                    outcome.failures.push(e.to_string());
                    return outcome;
                }
            }
        }
    }

    fn try_insert(&self, items: &[&ReleasedItem], weight: i64) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO recommendations (item_name, plan_release, weight, is_active, purchase_method, purchase_channel)
                VALUES (?1, ?2, ?3, 1, ?4, ?5)
                "#,
            )?;
            for item in items {
                stmt.execute(params![
                    item.purchase_item,
                    item.purchaser,
                    weight,
                    item.purchase_method,
                    item.purchase_channel,
                ])?;
            }
        }
        tx.commit()?;
        Ok(items.len())
    }

    // ==========================================
    // 同步日志
    // ==========================================

    pub fn save_sync_log(&self, log: &SyncLog) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sync_logs (run_id, start_time, end_time, total_candidates, inserted, skipped, failed, details)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.run_id,
                log.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                log.end_time.map(|t| t.format(TIME_FORMAT).to_string()),
                log.total_candidates,
                log.inserted,
                log.skipped,
                log.failed,
                log.details,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 最近的同步日志（新在前）
    pub fn list_sync_logs(&self, limit: usize) -> RepositoryResult<Vec<SyncLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, run_id, start_time, end_time, total_candidates, inserted, skipped, failed, details
            FROM sync_logs
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let parse_time = |s: Option<String>| {
            s.and_then(|s| NaiveDateTime::parse_from_str(&s, TIME_FORMAT).ok())
        };
        let logs = stmt
            .query_map(params![limit as i64], |row| {
                Ok(SyncLog {
                    id: row.get(0)?,
                    run_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    start_time: parse_time(row.get(2)?),
                    end_time: parse_time(row.get(3)?),
                    total_candidates: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                    inserted: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                    skipped: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                    failed: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
                    details: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}
