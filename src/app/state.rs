// ==========================================
// 采购计划管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 红线: 所有仓储共用一个连接，跨表事务才能原子提交
// ==========================================

use std::sync::Arc;

use crate::api::{
    ConfigApi, DashboardApi, MasterDataApi, MonthlyPlanApi, OrderApi, RecommendationApi,
    ReleaseApi,
};
use crate::config::config_manager::ConfigManager;
use crate::db::{configure_with_busy_timeout, open_shared_connection};
use crate::engine::{DetailLedger, IdentifierGenerator, OrderIdentityMutator};
use crate::repository::{
    CounterRepository, DetailRepository, DictionaryRepository, MonthlyPlanRepository,
    OperationLogRepository, OrderRepository, RecommendationRepository, ReleaseGroupRepository,
    StatsRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 采购计划API
    pub order_api: Arc<OrderApi>,

    /// 计划发放API
    pub release_api: Arc<ReleaseApi>,

    /// 推荐库API
    pub recommendation_api: Arc<RecommendationApi>,

    /// 基础数据API
    pub master_data_api: Arc<MasterDataApi>,

    /// 月度计划API
    pub monthly_plan_api: Arc<MonthlyPlanApi>,

    /// 工作台API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时创建并建表）
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;

        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        match config_manager.busy_timeout_ms() {
            Ok(timeout_ms) => {
                let guard = conn.lock().map_err(|e| format!("数据库锁获取失败: {}", e))?;
                configure_with_busy_timeout(&guard, timeout_ms)
                    .map_err(|e| format!("无法设置busy_timeout: {}", e))?;
            }
            Err(e) => tracing::warn!("读取busy_timeout配置失败，使用默认值: {}", e),
        }

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let detail_repo = Arc::new(DetailRepository::from_connection(conn.clone()));
        let release_repo = Arc::new(ReleaseGroupRepository::from_connection(conn.clone()));
        let counter_repo = Arc::new(CounterRepository::from_connection(conn.clone()));
        let op_log_repo = Arc::new(OperationLogRepository::from_connection(conn.clone()));
        let recommendation_repo = Arc::new(RecommendationRepository::from_connection(conn.clone()));
        let dictionary_repo = Arc::new(DictionaryRepository::from_connection(conn.clone()));
        let monthly_plan_repo = Arc::new(MonthlyPlanRepository::from_connection(conn.clone()));
        let stats_repo = Arc::new(StatsRepository::from_connection(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let generator = Arc::new(IdentifierGenerator::new(counter_repo.clone(), detail_repo.clone()));
        let ledger = Arc::new(DetailLedger::new(conn.clone()));
        let mutator = Arc::new(OrderIdentityMutator::new(conn.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let order_api = Arc::new(OrderApi::new(
            conn,
            order_repo,
            detail_repo.clone(),
            release_repo.clone(),
            counter_repo,
            op_log_repo,
            generator,
            ledger,
            mutator,
        ));
        let release_api = Arc::new(ReleaseApi::new(release_repo, detail_repo));
        let recommendation_api = Arc::new(RecommendationApi::new(
            recommendation_repo,
            config_manager.clone(),
        ));
        let master_data_api = Arc::new(MasterDataApi::new(dictionary_repo));
        let monthly_plan_api = Arc::new(MonthlyPlanApi::new(monthly_plan_repo));
        let dashboard_api = Arc::new(DashboardApi::new(stats_repo));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            order_api,
            release_api,
            recommendation_api,
            master_data_api,
            monthly_plan_api,
            dashboard_api,
            config_api,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PURCHASE_PLAN_DB_PATH → 用户数据目录/purchase-plan/purchase_plan.db → ./purchase_plan.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("PURCHASE_PLAN_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("purchase-plan");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir.join("purchase_plan.db").to_string_lossy().to_string();
        }
    }

    "./purchase_plan.db".to_string()
}
