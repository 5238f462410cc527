// ==========================================
// 采购计划管理系统 - 基础数据 API
// ==========================================
// 单位 / 采购员 / 采购状态 / 计划月份 四张字典表
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::repository::{DictionaryKind, DictionaryRepository};
use std::sync::Arc;

pub struct MasterDataApi {
    repo: Arc<DictionaryRepository>,
}

impl MasterDataApi {
    pub fn new(repo: Arc<DictionaryRepository>) -> Self {
        Self { repo }
    }

    pub fn list(&self, kind: DictionaryKind) -> ApiResult<Vec<String>> {
        Ok(self.repo.list(kind)?)
    }

    /// 新增条目（去空白）；空值或已存在返回 false
    pub fn add(&self, kind: DictionaryKind, name: &str) -> ApiResult<bool> {
        let added = self.repo.add(kind, name)?;
        if added {
            tracing::info!(table = kind.table(), name = name.trim(), "基础数据已新增");
        }
        Ok(added)
    }

    /// 重命名条目；有行被修改时返回 true
    pub fn rename(&self, kind: DictionaryKind, old_name: &str, new_name: &str) -> ApiResult<bool> {
        if new_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("名称不能为空".to_string()));
        }
        Ok(self.repo.rename(kind, old_name, new_name)?)
    }
}
