// ==========================================
// 采购计划管理系统 - 领域类型定义
// ==========================================
// 类别代码 / 发放状态 / 处理状态 / 改号模式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计划类别 (Category)
// ==========================================
// 代码参与单号拼接，必须逐字节兼容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "MP")]
    Civil, // 民品（缺省）
    #[serde(rename = "MPJ")]
    Machined, // 机加件
    #[serde(rename = "MPB")]
    SemiFinished, // 半成品
    #[serde(rename = "MPB_WX")]
    ExportModule, // 外销模块
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Civil,
        Category::Machined,
        Category::SemiFinished,
        Category::ExportModule,
    ];

    /// 单号中的类别代码
    pub fn code(&self) -> &'static str {
        match self {
            Category::Civil => "MP",
            Category::Machined => "MPJ",
            Category::SemiFinished => "MPB",
            Category::ExportModule => "MPB_WX",
        }
    }

    /// 界面显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Civil => "民品",
            Category::Machined => "机加件",
            Category::SemiFinished => "半成品",
            Category::ExportModule => "外销模块",
        }
    }

    /// 按代码精确解析，未知代码回落为民品
    pub fn from_code(code: &str) -> Self {
        match code {
            "MPJ" => Category::Machined,
            "MPB" => Category::SemiFinished,
            "MPB_WX" => Category::ExportModule,
            _ => Category::Civil,
        }
    }

    /// 从显示标签（如 "机加件 (MPJ)"）反解类别
    ///
    /// 按 MPJ → MPB_WX → MPB → MP 的优先级做子串判断
    pub fn from_display(label: &str) -> Self {
        if label.contains("MPJ") {
            Category::Machined
        } else if label.contains("MPB_WX") {
            Category::ExportModule
        } else if label.contains("MPB") {
            Category::SemiFinished
        } else {
            Category::Civil
        }
    }

    /// 月度导出排序：半成品 → 民品 → 机加件 → 其他
    pub fn export_rank(code: &str) -> u8 {
        match code {
            "MPB" => 1,
            "MP" => 2,
            "MPJ" => 3,
            _ => 99,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Civil
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 发放状态 (Release Status)
// ==========================================
// 库中以中文文本存储；未发放/待发放均视为未完成
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseStatus {
    Unreleased,    // 未发放
    Pending,       // 待发放（同步新建时的初始状态）
    Released,      // 已发放
    Purchasing,    // 采购中
    Completed,     // 已完成
    Other(String), // 字典中自定义的其他状态
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ReleaseStatus::Unreleased => "未发放",
            ReleaseStatus::Pending => "待发放",
            ReleaseStatus::Released => "已发放",
            ReleaseStatus::Purchasing => "采购中",
            ReleaseStatus::Completed => "已完成",
            ReleaseStatus::Other(s) => s.as_str(),
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s.trim() {
            "未发放" => ReleaseStatus::Unreleased,
            "待发放" => ReleaseStatus::Pending,
            "已发放" => ReleaseStatus::Released,
            "采购中" => ReleaseStatus::Purchasing,
            "已完成" => ReleaseStatus::Completed,
            other => ReleaseStatus::Other(other.to_string()),
        }
    }

    /// 是否仍待发放（决定单据汇总状态）
    pub fn is_outstanding(&self) -> bool {
        matches!(self, ReleaseStatus::Unreleased | ReleaseStatus::Pending)
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 单据处理状态（汇总，只读）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderProcessingStatus {
    Unreleased,
    Released,
}

impl OrderProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderProcessingStatus::Unreleased => "未发放",
            OrderProcessingStatus::Released => "已发放",
        }
    }
}

impl fmt::Display for OrderProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 单据身份变更模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityChangeMode {
    Simple,     // 仅改任务名/单位，单号不变
    Regenerate, // 月份或类别变化，重新发号并级联
}

impl fmt::Display for IdentityChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityChangeMode::Simple => write!(f, "simple"),
            IdentityChangeMode::Regenerate => write!(f, "regenerate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_display_priority() {
        assert_eq!(Category::from_display("机加件 (MPJ)"), Category::Machined);
        assert_eq!(Category::from_display("外销模块 MPB_WX"), Category::ExportModule);
        assert_eq!(Category::from_display("半成品 MPB"), Category::SemiFinished);
        assert_eq!(Category::from_display("民品"), Category::Civil);
        assert_eq!(Category::from_display(""), Category::Civil);
    }

    #[test]
    fn test_category_code_round_trip_and_fallback() {
        for c in Category::ALL {
            assert_eq!(Category::from_code(c.code()), c);
        }
        assert_eq!(Category::from_code("XYZ"), Category::Civil);
    }

    #[test]
    fn test_release_status_outstanding() {
        assert!(ReleaseStatus::from_db_str("未发放").is_outstanding());
        assert!(ReleaseStatus::from_db_str("待发放").is_outstanding());
        assert!(!ReleaseStatus::from_db_str("已发放").is_outstanding());
        assert!(!ReleaseStatus::from_db_str("采购中").is_outstanding());
        assert_eq!(
            ReleaseStatus::from_db_str("暂停"),
            ReleaseStatus::Other("暂停".to_string())
        );
    }
}
