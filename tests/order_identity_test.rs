// ==========================================
// 主单信息变更集成测试
// ==========================================
// 测试目标: 简单更新 / 改号级联（主单、发放分组、明细号前缀）与操作日志
// ==========================================

mod test_helpers;

use purchase_plan::api::ApiError;
use purchase_plan::domain::{OrderFilter, OrderIdentityUpdate, ReleaseFilter};
use purchase_plan::repository::CounterRepository;
use purchase_plan::{Category, IdentityChangeMode};
use test_helpers::{create_test_state, details_for, open_test_connection, order_with_number};

const OLD_NUMBER: &str = "CG-2601MP0007";

fn seeded_state() -> (tempfile::NamedTempFile, purchase_plan::AppState) {
    let (temp_file, state) = create_test_state();
    state
        .order_api
        .save_order(&order_with_number(OLD_NUMBER, "2601", Category::Civil))
        .unwrap();
    state
        .order_api
        .save_details(OLD_NUMBER, &details_for(&["2601MP-1", "2601MP-2", "2601MP-3"], "张三"))
        .unwrap();
    (temp_file, state)
}

fn update(task_name: &str, unit: &str, category: Category, year_month: &str) -> OrderIdentityUpdate {
    OrderIdentityUpdate {
        task_name: task_name.to_string(),
        unit: unit.to_string(),
        category,
        year_month: year_month.to_string(),
    }
}

#[test]
fn test_regenerate_cascades_number_and_preserves_suffixes() {
    let (_temp_file, state) = seeded_state();
    let api = &state.order_api;

    // (2602, MPJ) 计数器已被占用过一次
    assert_eq!(api.mint_main_number("2602", Category::Machined).unwrap(), "CG-2602MPJ0001");

    let outcome = api
        .update_order_identity(
            OLD_NUMBER,
            &update("测试任务", "生产部", Category::Machined, "2602"),
            "tester",
        )
        .unwrap();
    assert_eq!(outcome.mode, IdentityChangeMode::Regenerate);
    assert_eq!(outcome.old_number, OLD_NUMBER);
    assert_eq!(outcome.new_number, "CG-2602MPJ0002");
    assert_eq!(outcome.renamed_details, 3);
    assert!(outcome.message.contains("CG-2602MPJ0002"));

    // 旧单号在主单、明细、发放分组中均不复存在
    assert!(matches!(api.find_order(OLD_NUMBER), Err(ApiError::NotFound(_))));
    assert_eq!(api.count_details(OLD_NUMBER).unwrap(), 0);
    let old_groups = state
        .release_api
        .list_release_groups(&ReleaseFilter {
            number: Some(OLD_NUMBER.to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(old_groups.is_empty());

    let renamed = api.find_order("CG-2602MPJ0002").unwrap();
    assert_eq!(renamed.year_month, "2602");
    assert_eq!(renamed.category, Category::Machined);

    let numbers: Vec<String> = api
        .export_details("CG-2602MPJ0002")
        .unwrap()
        .into_iter()
        .map(|l| l.detail_no)
        .collect();
    assert_eq!(numbers, vec!["2602MPJ-1", "2602MPJ-2", "2602MPJ-3"]);

    let new_groups = state
        .release_api
        .list_release_groups(&ReleaseFilter {
            number: Some("CG-2602MPJ0002".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(new_groups.len(), 1);
    assert_eq!(new_groups[0].group.record_count, 3);
    assert_eq!(new_groups[0].year_month.as_deref(), Some("2602"));

    // 改号后新前缀下继续 max+1
    assert_eq!(
        api.mint_detail_number("2602", Category::Machined).unwrap(),
        "2602MPJ-4"
    );
    assert_eq!(api.mint_detail_number("2601", Category::Civil).unwrap(), "2601MP-1");
}

#[test]
fn test_regenerate_refreshes_detail_cache_for_both_prefixes() {
    let (_temp_file, state) = seeded_state();
    state
        .order_api
        .recalc_detail_counter("2601", Category::Civil)
        .unwrap();

    state
        .order_api
        .update_order_identity(
            OLD_NUMBER,
            &update("测试任务", "生产部", Category::Civil, "2603"),
            "tester",
        )
        .unwrap();

    let counters = CounterRepository::new(state.get_db_path()).unwrap();
    assert_eq!(counters.cached_detail_max("2603", Category::Civil).unwrap(), Some(3));
    assert_eq!(counters.cached_detail_max("2601", Category::Civil).unwrap(), Some(0));
}

#[test]
fn test_regenerate_writes_operation_logs_under_new_number() {
    let (_temp_file, state) = seeded_state();
    let api = &state.order_api;

    let outcome = api
        .update_order_identity(
            OLD_NUMBER,
            &update("新任务", "生产部", Category::SemiFinished, "2601"),
            "王五",
        )
        .unwrap();

    let logs = api.operation_logs(&outcome.new_number).unwrap();
    let fields: Vec<&str> = logs.iter().map(|l| l.field.as_str()).collect();
    assert!(fields.contains(&"number"));
    assert!(fields.contains(&"task_name"));
    assert!(!fields.contains(&"unit"));

    let number_log = logs.iter().find(|l| l.field == "number").unwrap();
    assert_eq!(number_log.old_value, OLD_NUMBER);
    assert_eq!(number_log.new_value, outcome.new_number);
    assert_eq!(number_log.operator, "王五");
}

#[test]
fn test_simple_update_keeps_number() {
    let (_temp_file, state) = seeded_state();
    let api = &state.order_api;

    let outcome = api
        .update_order_identity(
            OLD_NUMBER,
            &update("新任务", "采购部", Category::Civil, "2601"),
            "tester",
        )
        .unwrap();
    assert_eq!(outcome.mode, IdentityChangeMode::Simple);
    assert_eq!(outcome.new_number, OLD_NUMBER);
    assert_eq!(outcome.renamed_details, 0);

    let order = api.find_order(OLD_NUMBER).unwrap();
    assert_eq!(order.task_name, "新任务");
    assert_eq!(order.unit, "采购部");
    assert_eq!(api.count_details(OLD_NUMBER).unwrap(), 3);

    let logs = api.operation_logs(OLD_NUMBER).unwrap();
    assert_eq!(logs.len(), 2);

    // 简单更新不消耗计数器
    assert_eq!(api.mint_main_number("2601", Category::Civil).unwrap(), "CG-2601MP0001");
}

#[test]
fn test_missing_order_and_invalid_month() {
    let (_temp_file, state) = seeded_state();
    let api = &state.order_api;

    let err = api
        .update_order_identity(
            "CG-2601MP9999",
            &update("任务", "生产部", Category::Machined, "2602"),
            "tester",
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api
        .update_order_identity(
            OLD_NUMBER,
            &update("任务", "生产部", Category::Machined, "2A02"),
            "tester",
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 原单保持不变
    let listed = api
        .list_orders(&OrderFilter {
            number: Some("2601MP".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].number, OLD_NUMBER);
    assert_eq!(api.count_details(OLD_NUMBER).unwrap(), 3);
}

#[test]
fn test_failed_cascade_rolls_back_and_keeps_counter() {
    let (_temp_file, state) = seeded_state();
    let api = &state.order_api;

    // 另一个连接挂上触发器，使明细改号步骤失败（此时计数器已在事务内自增）
    let other = open_test_connection(state.get_db_path()).unwrap();
    other
        .execute_batch(
            "CREATE TRIGGER fail_detail_rename BEFORE UPDATE OF detail_no ON order_details
             BEGIN SELECT RAISE(ABORT, 'rename blocked'); END;",
        )
        .unwrap();

    let result = api.update_order_identity(
        OLD_NUMBER,
        &update("测试任务", "生产部", Category::Machined, "2602"),
        "tester",
    );
    assert!(result.is_err());

    let order = api.find_order(OLD_NUMBER).unwrap();
    assert_eq!(order.year_month, "2601");
    assert_eq!(order.category, Category::Civil);
    assert_eq!(api.count_details(OLD_NUMBER).unwrap(), 3);
    assert!(api.operation_logs(OLD_NUMBER).unwrap().is_empty());
    let groups = state
        .release_api
        .list_release_groups(&ReleaseFilter {
            number: Some(OLD_NUMBER.to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(groups.len(), 1);

    let counters = CounterRepository::new(state.get_db_path()).unwrap();
    assert_eq!(counters.current_main_sequence("2602", Category::Machined).unwrap(), None);

    other.execute_batch("DROP TRIGGER fail_detail_rename;").unwrap();
    let outcome = api
        .update_order_identity(
            OLD_NUMBER,
            &update("测试任务", "生产部", Category::Machined, "2602"),
            "tester",
        )
        .unwrap();
    assert_eq!(outcome.new_number, "CG-2602MPJ0001");
}
