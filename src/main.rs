// ==========================================
// 采购计划管理系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 启动时完成建表，并输出工作台概况
// ==========================================

use purchase_plan::app::{get_default_db_path, AppState};
use purchase_plan::logging;

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", purchase_plan::APP_NAME);
    tracing::info!("系统版本: {}", purchase_plan::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path).expect("无法初始化AppState");

    match app_state.dashboard_api.workbench_stats(None) {
        Ok(stats) => tracing::info!(
            total = stats.total_plans,
            pending = stats.pending_plans,
            processed = stats.processed_plans,
            amount = stats.total_amount,
            "工作台概况"
        ),
        Err(e) => tracing::error!("工作台统计失败: {}", e),
    }
}
