// ==========================================
// 采购计划管理系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少批量写入时的偶发 busy 错误
// - 建表幂等，首次建库写入字典默认值
// ==========================================

use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    configure_with_busy_timeout(conn, DEFAULT_BUSY_TIMEOUT_MS)
}

/// 以指定 busy_timeout 配置连接（推荐库同步读取 config_kv 后调用）
pub fn configure_with_busy_timeout(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、补齐表结构，并包装为仓储共享的句柄
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 判断是否为“库忙”类错误（SQLITE_BUSY / SQLITE_LOCKED）
pub fn is_busy_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

// ==========================================
// RetryPolicy - 库忙重试策略
// ==========================================

/// 有界指数退避：第 n 次重试前等待 min(base * 2^(n-1), max_delay)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次失败后的最大重试次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(2),
        }
    }

    /// 第 attempt 次重试（从 1 开始）前的等待时长
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

// ==========================================
// Schema
// ==========================================

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- 主单号计数器：只增不减
CREATE TABLE IF NOT EXISTS counter (
    yymm TEXT NOT NULL,
    category TEXT NOT NULL,
    seq INTEGER NOT NULL,
    PRIMARY KEY (yymm, category)
);

-- 明细最大序号缓存：仅供诊断，不参与发号
CREATE TABLE IF NOT EXISTS detail_counter (
    yymm TEXT NOT NULL,
    category TEXT NOT NULL,
    seq INTEGER NOT NULL,
    PRIMARY KEY (yymm, category)
);

CREATE TABLE IF NOT EXISTS orders (
    number TEXT PRIMARY KEY,
    yymm TEXT,
    category TEXT,
    unit TEXT,
    date TEXT,
    task_name TEXT
);

CREATE TABLE IF NOT EXISTS order_details (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_number TEXT,
    detail_no TEXT,
    item_name TEXT,
    purchase_item TEXT,
    spec_model TEXT,
    purchase_cycle TEXT,
    stock_count TEXT,
    purchase_qty TEXT,
    unit TEXT,
    unit_price TEXT,
    budget_wan TEXT,
    purchase_method TEXT,
    purchase_channel TEXT,
    plan_time TEXT,
    demand_unit TEXT,
    plan_release TEXT,
    progress_req TEXT,
    supplier TEXT,
    inquiry_price TEXT,
    tax_rate TEXT,
    actual_status TEXT,
    purchase_body TEXT,
    add_adjust TEXT,
    remark TEXT
);
CREATE INDEX IF NOT EXISTS idx_order_details_order ON order_details(order_number);
CREATE INDEX IF NOT EXISTS idx_order_details_detail_no ON order_details(detail_no);

CREATE TABLE IF NOT EXISTS release_orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_order_number TEXT,
    purchaser TEXT,
    release_date TEXT,
    status TEXT,
    record_count INTEGER,
    UNIQUE(source_order_number, purchaser)
);

CREATE TABLE IF NOT EXISTS operation_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_number TEXT,
    field TEXT,
    old_value TEXT,
    new_value TEXT,
    operator TEXT,
    op_time TEXT
);

CREATE TABLE IF NOT EXISTS units (name TEXT PRIMARY KEY);
CREATE TABLE IF NOT EXISTS purchasers (name TEXT PRIMARY KEY);
CREATE TABLE IF NOT EXISTS purchase_status (name TEXT PRIMARY KEY);
CREATE TABLE IF NOT EXISTS plan_months (name TEXT PRIMARY KEY);

CREATE TABLE IF NOT EXISTS recommendations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_name TEXT,
    plan_release TEXT,
    weight INTEGER,
    is_active INTEGER DEFAULT 1,
    purchase_method TEXT,
    purchase_channel TEXT
);

CREATE TABLE IF NOT EXISTS sync_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT,
    start_time TEXT,
    end_time TEXT,
    total_candidates INTEGER,
    inserted INTEGER,
    skipped INTEGER,
    failed INTEGER,
    details TEXT
);

CREATE TABLE IF NOT EXISTS monthly_plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plan_month TEXT,
    item_name TEXT,
    spec_model TEXT,
    unit TEXT,
    plan_qty REAL,
    plan_budget REAL,
    department TEXT,
    remarks TEXT
);
"#;

/// 字典表默认值（仅在表为空时写入）
const DICTIONARY_SEEDS: &[(&str, &[&str])] = &[
    ("units", &["生产部", "采购部", "仓储部"]),
    ("purchase_status", &["未发放", "已发放", "采购中", "已完成"]),
    ("plan_months", &["2601", "2602", "2603"]),
];

/// 建表（幂等）并写入字典默认值与 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    for (table, names) in DICTIONARY_SEEDS {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(1) FROM {}", table), [], |row| row.get(0))?;
        if count == 0 {
            let sql = format!("INSERT INTO {}(name) VALUES(?1)", table);
            for name in names.iter() {
                conn.execute(&sql, [name])?;
            }
        }
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version(version) VALUES(?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    match read_schema_version(conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                "数据库 schema_version={} 高于程序期望值 {}，请确认程序版本",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        _ => {}
    }

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent_and_seeds_once() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let units: i64 = conn
            .query_row("SELECT COUNT(1) FROM units", [], |row| row.get(0))
            .unwrap();
        assert_eq!(units, 3);
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_read_schema_version_without_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_retry_policy_backoff_is_bounded() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(10), Duration::from_millis(2000));
    }
}
