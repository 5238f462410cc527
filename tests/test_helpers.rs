// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDate;
use purchase_plan::app::AppState;
use purchase_plan::db::{ensure_schema, open_sqlite_connection};
use purchase_plan::domain::{DetailEntry, DetailFields, NewOrder, Order};
use purchase_plan::Category;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开一个独立连接（模拟另一个写入方）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(Connection::open(db_path)?)
}

/// 基于临时数据库创建完整的 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).expect("Failed to create AppState");
    (temp_file, state)
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

pub fn new_order(year_month: &str, category: Category) -> NewOrder {
    NewOrder {
        year_month: year_month.to_string(),
        category,
        unit: "生产部".to_string(),
        date: test_date(),
        task_name: "测试任务".to_string(),
    }
}

/// 指定单号的主单（模拟历史数据）
pub fn order_with_number(number: &str, year_month: &str, category: Category) -> Order {
    Order {
        number: number.to_string(),
        year_month: year_month.to_string(),
        category,
        unit: "生产部".to_string(),
        date: test_date(),
        task_name: "测试任务".to_string(),
    }
}

/// 明细行：明细号 + 采购员 + 采购标的
pub fn detail(detail_no: &str, purchaser: &str, purchase_item: &str) -> DetailEntry {
    DetailEntry::new(
        detail_no,
        DetailFields {
            item_name: purchase_item.to_string(),
            purchase_item: purchase_item.to_string(),
            quantity: "1".to_string(),
            plan_release: purchaser.to_string(),
            ..Default::default()
        },
    )
}

/// 一组明细号，均分配给同一采购员
pub fn details_for(detail_nos: &[&str], purchaser: &str) -> Vec<DetailEntry> {
    detail_nos
        .iter()
        .map(|no| detail(no, purchaser, "螺栓"))
        .collect()
}
