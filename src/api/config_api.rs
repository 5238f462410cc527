// ==========================================
// 采购计划管理系统 - 配置管理 API
// ==========================================
// 职责: 系统调优参数的查询与修改（config_kv 全局作用域）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 全部配置快照（JSON 对象，key 有序）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 查询单个配置
    ///
    /// # 返回
    /// - Ok(None): 配置不存在（调用方使用默认值）
    pub fn get_config(&self, key: &str) -> ApiResult<Option<String>> {
        self.config_manager
            .get_global_config_value(key)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }

    /// 更新配置
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        if key.trim().is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        self.config_manager
            .set_value(key.trim(), value.trim())
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }
}
