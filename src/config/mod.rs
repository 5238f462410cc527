// ==========================================
// 采购计划管理系统 - 配置层
// ==========================================
// 职责: 系统调优参数（同步批量、重试、默认权重、busy_timeout）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
