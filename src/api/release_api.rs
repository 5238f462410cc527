// ==========================================
// 采购计划管理系统 - 计划发放 API
// ==========================================
// 发放分组由明细保存自动维护；此处只读，外加状态修改
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::detail::DetailLine;
use crate::domain::release::{ReleaseFilter, ReleaseGroupView};
use crate::domain::types::ReleaseStatus;
use crate::i18n::t_with_args;
use crate::repository::{DetailRepository, ReleaseGroupRepository, RepositoryError};
use std::sync::Arc;

pub struct ReleaseApi {
    release_repo: Arc<ReleaseGroupRepository>,
    detail_repo: Arc<DetailRepository>,
}

impl ReleaseApi {
    pub fn new(release_repo: Arc<ReleaseGroupRepository>, detail_repo: Arc<DetailRepository>) -> Self {
        Self {
            release_repo,
            detail_repo,
        }
    }

    pub fn list_release_groups(&self, filter: &ReleaseFilter) -> ApiResult<Vec<ReleaseGroupView>> {
        Ok(self.release_repo.list(filter)?)
    }

    /// 某采购员在某单下的明细（小号在前）
    pub fn release_details(&self, order_number: &str, purchaser: &str) -> ApiResult<Vec<DetailLine>> {
        Ok(self.detail_repo.find_release_view(order_number, purchaser)?)
    }

    pub fn update_release_status(
        &self,
        order_number: &str,
        purchaser: &str,
        status: &str,
    ) -> ApiResult<()> {
        let status = status.trim();
        if status.is_empty() {
            return Err(ApiError::InvalidInput("状态不能为空".to_string()));
        }
        self.release_repo
            .update_status(order_number, purchaser, &ReleaseStatus::from_db_str(status))
            .map_err(|e| match e {
                RepositoryError::NotFound { .. } => ApiError::NotFound(t_with_args(
                    "release.not_found",
                    &[("number", order_number), ("purchaser", purchaser)],
                )),
                other => other.into(),
            })?;
        tracing::info!(order_number, purchaser, status, "发放状态已更新");
        Ok(())
    }
}
