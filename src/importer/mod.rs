// ==========================================
// 采购计划管理系统 - 导入层
// ==========================================
// 职责: 从 CSV / Excel 读取推荐规则与月度计划
// ==========================================

pub mod error;
pub mod file_parser;
pub mod monthly_plan_importer;
pub mod rule_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use monthly_plan_importer::{plans_from_records, read_monthly_plan_file};
pub use rule_importer::{read_rule_file, rules_from_records};
