// ==========================================
// 采购计划管理系统 - API 层
// ==========================================
// 职责: 提供界面边界的业务接口，失败统一为 ApiError / ErrorResponse
// ==========================================

pub mod error;
pub mod config_api;
pub mod dashboard_api;
pub mod master_data_api;
pub mod monthly_plan_api;
pub mod order_api;
pub mod recommendation_api;
pub mod release_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use config_api::ConfigApi;
pub use dashboard_api::DashboardApi;
pub use master_data_api::MasterDataApi;
pub use monthly_plan_api::MonthlyPlanApi;
pub use order_api::OrderApi;
pub use recommendation_api::{RecommendationApi, SyncHandle};
pub use release_api::ReleaseApi;
