// ==========================================
// 采购计划管理系统 - 推荐库 API
// ==========================================
// 职责: 标的 → 采购员推荐、规则维护与导入、历史发放同步
// 红线: 同步在后台线程执行，可取消；取消只在批次之间生效
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::recommendation::{
    RecommendationHint, RecommendationRule, SyncLog, SyncProgress, SyncReport,
};
use crate::engine::recommendation::recommend;
use crate::importer::read_rule_file;
use crate::repository::RecommendationRepository;
use chrono::Local;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub struct RecommendationApi {
    repo: Arc<RecommendationRepository>,
    config: Arc<ConfigManager>,
}

impl RecommendationApi {
    pub fn new(repo: Arc<RecommendationRepository>, config: Arc<ConfigManager>) -> Self {
        Self { repo, config }
    }

    /// 根据标的名称推荐采购员/采购方式/采购途径
    pub fn recommend(&self, text: &str) -> ApiResult<Option<RecommendationHint>> {
        let rules = self.repo.active_rules()?;
        Ok(recommend(text, &rules))
    }

    pub fn list_rules(&self) -> ApiResult<Vec<RecommendationRule>> {
        Ok(self.repo.list_all()?)
    }

    /// 整表保存（界面编辑后提交）
    pub fn replace_rules(&self, rules: &[RecommendationRule]) -> ApiResult<usize> {
        if let Some(rule) = rules.iter().find(|r| r.item_name.trim().is_empty()) {
            return Err(ApiError::InvalidInput(format!(
                "标的名称不能为空(采购员: {})",
                rule.purchaser
            )));
        }
        Ok(self.repo.replace_all(rules)?)
    }

    /// 从文件追加规则，返回导入条数
    pub fn import_rules<P: AsRef<Path>>(&self, path: P) -> ApiResult<usize> {
        let imported = read_rule_file(path)?;
        let count = imported.len();

        let mut rules = self.repo.list_all()?;
        rules.extend(imported);
        self.repo.replace_all(&rules)?;

        tracing::info!(imported = count, total = rules.len(), "推荐规则导入完成");
        Ok(count)
    }

    pub fn list_sync_logs(&self, limit: usize) -> ApiResult<Vec<SyncLog>> {
        Ok(self.repo.list_sync_logs(limit)?)
    }

    // ==========================================
    // 历史同步
    // ==========================================

    /// 同步历史已发放明细到推荐库（阻塞执行）
    ///
    /// # 参数
    /// - `cancel`: 置位后在下一批开始前停止
    /// - `on_progress`: 每批完成后回调 (已处理, 总数)
    ///
    /// # 返回
    /// 汇总结果；同步日志写入失败只记警告
    pub fn run_sync<F>(&self, cancel: &AtomicBool, mut on_progress: F) -> ApiResult<SyncReport>
    where
        F: FnMut(SyncProgress),
    {
        let batch_size = self
            .config
            .sync_batch_size()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let policy = self
            .config
            .retry_policy()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let weight = self
            .config
            .default_recommendation_weight()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let start_time = Local::now().naive_local();
        let items = self.repo.released_items_for_sync()?;
        let total = items.len();

        let mut report = SyncReport {
            run_id: Uuid::new_v4().to_string(),
            total,
            ..Default::default()
        };
        tracing::info!(run_id = report.run_id.as_str(), total, batch_size, "开始同步推荐库");
        on_progress(SyncProgress { done: 0, total });

        let mut done = 0;
        for chunk in items.chunks(batch_size) {
            if cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                tracing::info!(run_id = report.run_id.as_str(), done, "同步已取消");
                break;
            }

            let outcome = self.repo.insert_batch(chunk, weight, &policy);
            report.inserted += outcome.inserted;
            report.skipped += outcome.skipped;
            report.failed += outcome.failed;
            report.failures.extend(outcome.failures);

            done += chunk.len();
            tracing::debug!(done, total, "同步批次完成");
            on_progress(SyncProgress { done, total });
        }

        let log = SyncLog {
            id: 0,
            run_id: report.run_id.clone(),
            start_time: Some(start_time),
            end_time: Some(Local::now().naive_local()),
            total_candidates: total as i64,
            inserted: report.inserted as i64,
            skipped: report.skipped as i64,
            failed: report.failed as i64,
            details: report.failures.join("\n"),
        };
        if let Err(e) = self.repo.save_sync_log(&log) {
            tracing::warn!(error = %e, "同步日志写入失败");
        }

        tracing::info!(
            run_id = report.run_id.as_str(),
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failed,
            "推荐库同步结束"
        );
        Ok(report)
    }

    /// 在后台线程启动同步（需在 tokio 运行时内调用）
    pub fn start_sync(self: &Arc<Self>) -> SyncHandle {
        let (progress_tx, progress_rx) = watch::channel(SyncProgress::default());
        let cancel = Arc::new(AtomicBool::new(false));

        let api = Arc::clone(self);
        let flag = Arc::clone(&cancel);
        let task = tokio::task::spawn_blocking(move || {
            api.run_sync(&flag, |p| {
                // 无订阅者时忽略
                let _ = progress_tx.send(p);
            })
        });

        SyncHandle {
            cancel,
            progress: progress_rx,
            task,
        }
    }
}

/// 后台同步句柄
pub struct SyncHandle {
    cancel: Arc<AtomicBool>,
    progress: watch::Receiver<SyncProgress>,
    task: JoinHandle<ApiResult<SyncReport>>,
}

impl SyncHandle {
    /// 请求取消（当前批次写完后停止）
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// 最近一次上报的进度
    pub fn progress(&self) -> SyncProgress {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.clone()
    }

    pub async fn join(self) -> ApiResult<SyncReport> {
        self.task
            .await
            .map_err(|e| ApiError::InternalError(format!("同步任务异常退出: {}", e)))?
    }
}
