// ==========================================
// 采购计划管理系统 - 月度计划 API
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::monthly_plan::{MonthlyPlan, MonthlyPlanExecution};
use crate::engine::identifier::is_valid_year_month;
use crate::importer::read_monthly_plan_file;
use crate::repository::MonthlyPlanRepository;
use std::path::Path;
use std::sync::Arc;

pub struct MonthlyPlanApi {
    repo: Arc<MonthlyPlanRepository>,
}

impl MonthlyPlanApi {
    pub fn new(repo: Arc<MonthlyPlanRepository>) -> Self {
        Self { repo }
    }

    /// 新增或更新（id 为空时新增），返回记录 id
    pub fn save_plan(&self, plan: &MonthlyPlan) -> ApiResult<i64> {
        if !is_valid_year_month(&plan.plan_month) {
            return Err(ApiError::InvalidInput(format!("计划月份无效: {}", plan.plan_month)));
        }
        if plan.item_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("标的名称不能为空".to_string()));
        }
        Ok(self.repo.save(plan)?)
    }

    pub fn delete_plan(&self, id: i64) -> ApiResult<bool> {
        Ok(self.repo.delete(id)?)
    }

    /// 导入文件到指定月份，返回导入条数
    pub fn import_file<P: AsRef<Path>>(&self, path: P, plan_month: &str) -> ApiResult<usize> {
        let plans = read_monthly_plan_file(path, plan_month)?;
        let count = self.repo.import_rows(&plans)?;
        tracing::info!(plan_month, count, "月度计划导入完成");
        Ok(count)
    }

    /// 月度计划及其执行情况（按标的名称关联已录入明细）
    pub fn list_with_execution(&self, plan_month: &str) -> ApiResult<Vec<MonthlyPlanExecution>> {
        Ok(self.repo.list_with_execution(plan_month)?)
    }
}
