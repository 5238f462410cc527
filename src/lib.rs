// ==========================================
// 采购计划管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心职责: 单号生成 / 明细序号一致性 / 发放记录同步 / 推荐匹配
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 单号/序号/同步/推荐规则
pub mod engine;

// 导入层 - 推荐库与月度计划文件
pub mod importer;

// 配置层 - 系统参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 界面边界
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::types::{Category, IdentityChangeMode, OrderProcessingStatus, ReleaseStatus};

pub use domain::{
    DetailEntry, DetailFields, DetailLine, MonthlyPlan, NewOrder, Order, RecommendationHint,
    RecommendationRule, ReleaseGroup,
};

pub use engine::{DetailLedger, IdentifierGenerator, OrderIdentityMutator, SequenceReport};

pub use api::{
    ApiError, ApiResult, ConfigApi, DashboardApi, ErrorResponse, MasterDataApi, MonthlyPlanApi,
    OrderApi, RecommendationApi, ReleaseApi, SyncHandle,
};

pub use app::{get_default_db_path, AppState};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "采购计划管理系统";
