// ==========================================
// 单号生成集成测试
// ==========================================
// 测试目标: 主单号计数器单调递增、明细号 max+1 与顶号复用
// ==========================================

mod test_helpers;

use purchase_plan::api::ApiError;
use purchase_plan::app::AppState;
use purchase_plan::Category;
use test_helpers::{create_test_db, create_test_state, details_for, new_order, order_with_number};

#[test]
fn test_main_number_strictly_increasing_interleaved() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    assert_eq!(api.mint_main_number("2601", Category::Civil).unwrap(), "CG-2601MP0001");
    assert_eq!(api.mint_main_number("2601", Category::Machined).unwrap(), "CG-2601MPJ0001");
    assert_eq!(api.mint_main_number("2601", Category::Civil).unwrap(), "CG-2601MP0002");
    assert_eq!(api.mint_main_number("2602", Category::Civil).unwrap(), "CG-2602MP0001");
    assert_eq!(
        api.mint_main_number("2601", Category::ExportModule).unwrap(),
        "CG-2601MPB_WX0001"
    );
    assert_eq!(api.mint_main_number("2601", Category::Civil).unwrap(), "CG-2601MP0003");
}

#[test]
fn test_main_counter_survives_restart() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let state = AppState::new(db_path.clone()).unwrap();
        state.order_api.mint_main_number("2601", Category::SemiFinished).unwrap();
        state.order_api.mint_main_number("2601", Category::SemiFinished).unwrap();
    }

    let state = AppState::new(db_path).unwrap();
    assert_eq!(
        state.order_api.mint_main_number("2601", Category::SemiFinished).unwrap(),
        "CG-2601MPB0003"
    );
}

#[test]
fn test_create_order_consumes_counter_slot() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    let first = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    assert_eq!(first.number, "CG-2601MP0001");
    assert_eq!(api.find_order("CG-2601MP0001").unwrap().task_name, "测试任务");

    assert_eq!(api.mint_main_number("2601", Category::Civil).unwrap(), "CG-2601MP0002");
    let second = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    assert_eq!(second.number, "CG-2601MP0003");
}

#[test]
fn test_reset_test_data_clears_counters() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    let order = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    api.save_details(&order.number, &details_for(&["2601MP-1"], "张三")).unwrap();
    api.reset_test_data().unwrap();

    assert!(api.find_order(&order.number).is_err());
    assert_eq!(api.count_details(&order.number).unwrap(), 0);
    assert_eq!(api.mint_main_number("2601", Category::Civil).unwrap(), "CG-2601MP0001");
}

#[test]
fn test_detail_number_is_max_plus_one_not_gap_fill() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    let order = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    api.save_details(
        &order.number,
        &details_for(&["2601MP-1", "2601MP-2", "2601MP-3", "2601MP-5"], "张三"),
    )
    .unwrap();

    assert_eq!(api.mint_detail_number("2601", Category::Civil).unwrap(), "2601MP-6");
    // 未占号：再次生成结果相同
    assert_eq!(api.mint_detail_number("2601", Category::Civil).unwrap(), "2601MP-6");
}

#[test]
fn test_detail_number_reuses_top_after_delete() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    let order = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    api.save_details(&order.number, &details_for(&["2601MP-1", "2601MP-2", "2601MP-3"], "张三"))
        .unwrap();
    assert_eq!(api.mint_detail_number("2601", Category::Civil).unwrap(), "2601MP-4");

    // 删除最高号 3（整单保存时省略即删除）
    api.save_details(&order.number, &details_for(&["2601MP-1", "2601MP-2"], "张三"))
        .unwrap();
    assert_eq!(api.mint_detail_number("2601", Category::Civil).unwrap(), "2601MP-3");
}

#[test]
fn test_detail_number_spans_orders_and_ignores_malformed() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    let a = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    let b = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    api.save_details(&a.number, &details_for(&["2601MP-1", "2601MP-abc", "2601MP-"], "张三"))
        .unwrap();
    api.save_details(&b.number, &details_for(&["2601MP-7"], "李四")).unwrap();

    assert_eq!(api.mint_detail_number("2601", Category::Civil).unwrap(), "2601MP-8");
    // 其他月份/类别从 1 开始
    assert_eq!(api.mint_detail_number("2602", Category::Civil).unwrap(), "2602MP-1");
}

#[test]
fn test_detail_prefix_is_literal_for_export_module() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    api.save_order(&order_with_number("CG-2601MPB0001", "2601", Category::SemiFinished))
        .unwrap();
    api.save_order(&order_with_number("CG-2601MPB_WX0001", "2601", Category::ExportModule))
        .unwrap();
    api.save_details("CG-2601MPB0001", &details_for(&["2601MPB-2"], "张三"))
        .unwrap();
    api.save_details("CG-2601MPB_WX0001", &details_for(&["2601MPB_WX-9"], "张三"))
        .unwrap();

    assert_eq!(
        api.mint_detail_number("2601", Category::SemiFinished).unwrap(),
        "2601MPB-3"
    );
    assert_eq!(
        api.mint_detail_number("2601", Category::ExportModule).unwrap(),
        "2601MPB_WX-10"
    );
}

#[test]
fn test_invalid_year_month_rejected() {
    let (_temp_file, state) = create_test_state();

    let err = state.order_api.mint_main_number("26", Category::Civil).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    let err = state
        .order_api
        .create_order(&new_order("26A1", Category::Civil))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[test]
fn test_recalc_detail_counter_is_diagnostic_only() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;

    let order = api.create_order(&new_order("2601", Category::Machined)).unwrap();
    api.save_details(&order.number, &details_for(&["2601MPJ-1", "2601MPJ-4"], "张三"))
        .unwrap();
    assert_eq!(api.recalc_detail_counter("2601", Category::Machined).unwrap(), 4);

    // 缓存不参与发号：删除后仍按现存最大值计算
    api.save_details(&order.number, &details_for(&["2601MPJ-1"], "张三")).unwrap();
    assert_eq!(
        api.mint_detail_number("2601", Category::Machined).unwrap(),
        "2601MPJ-2"
    );
}

#[test]
fn test_detail_number_at_suffix_limit_is_rejected_not_panicking() {
    let (_temp_file, state) = create_test_state();
    let api = &state.order_api;
    let order = api.create_order(&new_order("2601", Category::Civil)).unwrap();
    api.save_details(
        &order.number,
        &details_for(&["2601MP-1", "2601MP-9223372036854775807"], "张三"),
    )
    .unwrap();

    let err = api.mint_detail_number("2601", Category::Civil).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 校验照常进行，缺失清单有上限
    let report = api.validate_sequence(&order.number).unwrap();
    assert!(!report.ok);
    assert_eq!(report.missing.first(), Some(&2));
    assert!(report.missing_total > report.missing.len() as u64);
}
