// ==========================================
// 采购计划管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (scope_id='global')
// ==========================================

use crate::db::{open_shared_connection, RetryPolicy, DEFAULT_BUSY_TIMEOUT_MS};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_shared_connection(db_path)?;
        Ok(Self { conn })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入配置（存在则覆盖）
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取整数配置；缺失或格式错误时返回默认值
    pub fn get_i64_or(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => Ok(raw.trim().parse::<i64>().unwrap_or_else(|_| {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值 {}", default);
                default
            })),
            None => Ok(default),
        }
    }

    // ===== 推荐库同步 =====

    /// 同步批大小（至少 1）
    pub fn sync_batch_size(&self) -> Result<usize, Box<dyn Error>> {
        let v = self.get_i64_or(config_keys::SYNC_BATCH_SIZE, 200)?;
        Ok(v.max(1) as usize)
    }

    /// 库忙重试策略
    pub fn retry_policy(&self) -> Result<RetryPolicy, Box<dyn Error>> {
        let max_retries = self.get_i64_or(config_keys::SYNC_MAX_RETRIES, 3)?.clamp(0, 10) as u32;
        let base_ms = self.get_i64_or(config_keys::SYNC_RETRY_BASE_DELAY_MS, 500)?.max(0) as u64;
        Ok(RetryPolicy::new(max_retries, Duration::from_millis(base_ms)))
    }

    /// 同步写入推荐库时使用的权重
    pub fn default_recommendation_weight(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or(config_keys::RECOMMENDATION_DEFAULT_WEIGHT, 100)
    }

    // ===== 数据库 =====

    pub fn busy_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let v = self.get_i64_or(config_keys::DB_BUSY_TIMEOUT_MS, DEFAULT_BUSY_TIMEOUT_MS as i64)?;
        Ok(v.max(0) as u64)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 推荐库同步
    pub const SYNC_BATCH_SIZE: &str = "sync.batch_size";
    pub const SYNC_MAX_RETRIES: &str = "sync.max_retries";
    pub const SYNC_RETRY_BASE_DELAY_MS: &str = "sync.retry_base_delay_ms";
    pub const RECOMMENDATION_DEFAULT_WEIGHT: &str = "recommendation.default_weight";

    // 数据库
    pub const DB_BUSY_TIMEOUT_MS: &str = "db.busy_timeout_ms";
}
