// ==========================================
// 采购计划管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: *_in / *_in_tx 关联函数接收调用方的连接或事务，
//       供引擎层在同一事务内组合多个仓储操作
// ==========================================

pub mod counter_repo;
pub mod detail_repo;
pub mod dictionary_repo;
pub mod error;
pub mod monthly_plan_repo;
pub mod operation_log_repo;
pub mod order_repo;
pub mod recommendation_repo;
pub mod release_repo;
pub mod stats_repo;

// 重导出核心仓储
pub use counter_repo::CounterRepository;
pub use detail_repo::DetailRepository;
pub use dictionary_repo::{DictionaryKind, DictionaryRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use monthly_plan_repo::MonthlyPlanRepository;
pub use operation_log_repo::OperationLogRepository;
pub use order_repo::OrderRepository;
pub use recommendation_repo::RecommendationRepository;
pub use release_repo::ReleaseGroupRepository;
pub use stats_repo::StatsRepository;
