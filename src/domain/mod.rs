// ==========================================
// 采购计划管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型（具名字段，禁止按列序号访问）
// 红线: 不含数据访问逻辑
// ==========================================

pub mod detail;
pub mod monthly_plan;
pub mod order;
pub mod recommendation;
pub mod release;
pub mod types;

// 重导出核心类型
pub use detail::{DetailEntry, DetailFields, DetailLine};
pub use monthly_plan::{
    MonthlyExportRow, MonthlyPlan, MonthlyPlanExecution, OperationLog, WorkbenchStats,
};
pub use order::{IdentityChangeOutcome, NewOrder, Order, OrderFilter, OrderIdentityUpdate};
pub use recommendation::{
    BatchInsertOutcome, RecommendationHint, RecommendationRule, ReleasedItem, SyncLog,
    SyncProgress, SyncReport,
};
pub use release::{ReleaseFilter, ReleaseGroup, ReleaseGroupView, ReleaseSyncOutcome};
pub use types::{Category, IdentityChangeMode, OrderProcessingStatus, ReleaseStatus};
