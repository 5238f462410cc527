// ==========================================
// 采购计划管理系统 - 引擎层
// ==========================================
// 职责: 单号规则、序号校验、发放分组投影、改号编排、推荐匹配、金额计算
// 红线: Engine 不拼 SQL，数据访问一律经由 repository
// ==========================================

pub mod identifier;
pub mod identity;
pub mod ledger;
pub mod money;
pub mod numbering;
pub mod recommendation;
pub mod release_projection;
pub mod sequence;

// 重导出核心引擎
pub use identifier::SuffixOrder;
pub use identity::{classify_identity_change, OrderIdentityMutator};
pub use ledger::{DetailLedger, LedgerSaveOutcome};
pub use money::calc_total;
pub use numbering::{CounterStore, DetailNumberSource, IdentifierGenerator};
pub use recommendation::{match_rule, recommend};
pub use release_projection::{plan_release_sync, rollup_status, ReleaseSyncPlan};
pub use sequence::{validate_suffixes, SequenceReport};
