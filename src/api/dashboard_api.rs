// ==========================================
// 采购计划管理系统 - 工作台 API
// ==========================================
// 职责: 工作台统计、月度导出数据行（只给数据，不做格式化）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::monthly_plan::{MonthlyExportRow, WorkbenchStats};
use crate::engine::identifier::is_valid_year_month;
use crate::repository::StatsRepository;

/// 工作台API
pub struct DashboardApi {
    stats_repo: Arc<StatsRepository>,
}

impl DashboardApi {
    pub fn new(stats_repo: Arc<StatsRepository>) -> Self {
        Self { stats_repo }
    }

    /// 工作台统计
    ///
    /// # 参数
    /// - year_month: 按年月过滤；None 或空串为全部
    pub fn workbench_stats(&self, year_month: Option<&str>) -> ApiResult<WorkbenchStats> {
        let filter = year_month.map(str::trim).filter(|ym| !ym.is_empty());
        Ok(self.stats_repo.workbench_stats(filter)?)
    }

    /// 月度导出数据行（类别顺序 → 明细序号升序）
    pub fn monthly_export_rows(&self, year_month: &str) -> ApiResult<Vec<MonthlyExportRow>> {
        if !is_valid_year_month(year_month) {
            return Err(ApiError::InvalidInput(format!("年月无效: {}", year_month)));
        }
        Ok(self.stats_repo.monthly_export_rows(year_month)?)
    }
}
