// ==========================================
// 业务流程集成测试
// ==========================================
// 测试目标: 通过 API 层验证 新增 → 分配 → 变更 → 删除 的完整流程
// ==========================================


use coil_allocation::api::ApiError;
use coil_allocation::domain::OrderLineKey;
use coil_allocation::logging;

const PRODUCT: &str = "AVVG-2x6";
const PRODUCT_2: &str = "AVVG-2x2.5";

#[test]
fn test_add_and_get_coil() {
    logging::init_test();
    let (_temp_file, state) = test_helpers::create_test_state();

    state
        .coil_api
        .add_coil("COIL-015", "AVVG-3x1.5", 70, 10, 2)
        .unwrap();
    state
        .coil_api
        .add_coil("COIL-016", PRODUCT_2, 200, 15, 3)
        .unwrap();

    let coil = state.coil_api.get_coil("COIL-016").unwrap();
    assert_eq!(coil.product_id, PRODUCT_2);
    assert_eq!(coil.recommended_balance, 15);
    assert_eq!(state.coil_api.list_coils().unwrap().len(), 2);

    let err = state.coil_api.get_coil("COIL-404").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_add_duplicate_coil_rejected() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-040", PRODUCT_2, 200, 15, 3).unwrap();
    let err = state
        .coil_api
        .add_coil("COIL-040", PRODUCT_2, 100, 15, 3)
        .unwrap_err();

    assert!(matches!(err, ApiError::AlreadyExists(_)));
}

#[test]
fn test_invalid_input_rejected() {
    let (_temp_file, state) = test_helpers::create_test_state();

    let err = state.coil_api.add_coil("X-1", PRODUCT, 100, 5, 1).unwrap_err();
    assert!(matches!(err, ApiError::ValidationError { ref field, .. } if field == "reference"));

    let err = state
        .order_line_api
        .add_line("ORDER-001", "LINE-001", PRODUCT, 0)
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError { ref field, .. } if field == "quantity"));

    assert!(state.coil_api.list_coils().unwrap().is_empty());
}

#[test]
fn test_allocate_picks_smallest_suitable_coil() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-041", PRODUCT, 70, 15, 3).unwrap();
    state.coil_api.add_coil("COIL-042", PRODUCT, 50, 15, 3).unwrap();
    state.order_line_api.add_line("ORDER-050", "LINE-002", PRODUCT, 16).unwrap();
    state.order_line_api.add_line("ORDER-051", "LINE-005", PRODUCT, 10).unwrap();

    let coil_1 = state.allocation_api.allocate("ORDER-050", "LINE-002").unwrap();
    let coil_2 = state.allocation_api.allocate("ORDER-051", "LINE-005").unwrap();

    assert_eq!(coil_1.reference, "COIL-042");
    assert_eq!(coil_2.reference, "COIL-042");
    assert_eq!(
        state.coil_api.get_coil("COIL-042").unwrap().available_quantity(),
        24
    );
    assert!(state.order_line_api.list_unallocated_lines().unwrap().is_empty());
}

#[test]
fn test_allocate_is_idempotent() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-041", PRODUCT, 70, 15, 3).unwrap();
    state.order_line_api.add_line("ORDER-050", "LINE-002", PRODUCT, 16).unwrap();

    state.allocation_api.allocate("ORDER-050", "LINE-002").unwrap();
    let coil = state.allocation_api.allocate("ORDER-050", "LINE-002").unwrap();

    assert_eq!(coil.reference, "COIL-041");
    assert_eq!(coil.available_quantity(), 54);
}

#[test]
fn test_allocate_out_of_stock() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-001", PRODUCT, 20, 5, 1).unwrap();
    state.coil_api.add_coil("COIL-002", PRODUCT_2, 500, 5, 1).unwrap();
    state.order_line_api.add_line("ORDER-001", "LINE-001", PRODUCT, 30).unwrap();

    let err = state.allocation_api.allocate("ORDER-001", "LINE-001").unwrap_err();

    assert!(matches!(err, ApiError::OutOfStock { ref product_id } if product_id == PRODUCT));
    assert_eq!(state.order_line_api.list_unallocated_lines().unwrap().len(), 1);
}

#[test]
fn test_allocate_missing_line() {
    let (_temp_file, state) = test_helpers::create_test_state();
    state.coil_api.add_coil("COIL-001", PRODUCT, 20, 5, 1).unwrap();

    let err = state.allocation_api.allocate("ORDER-404", "LINE-001").unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_deallocate_returns_former_holder() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-041", PRODUCT, 70, 15, 3).unwrap();
    state.coil_api.add_coil("COIL-042", PRODUCT, 50, 15, 3).unwrap();
    state.order_line_api.add_line("ORDER-050", "LINE-002", PRODUCT, 16).unwrap();
    state.order_line_api.add_line("ORDER-051", "LINE-005", PRODUCT, 10).unwrap();
    state.allocation_api.allocate("ORDER-050", "LINE-002").unwrap();
    state.allocation_api.allocate("ORDER-051", "LINE-005").unwrap();

    let coil_1 = state.allocation_api.deallocate("ORDER-050", "LINE-002").unwrap();
    let coil_2 = state.allocation_api.deallocate("ORDER-051", "LINE-005").unwrap();

    assert_eq!(coil_1.unwrap().reference, "COIL-042");
    assert_eq!(coil_2.unwrap().reference, "COIL-042");
    assert_eq!(
        state.coil_api.get_coil("COIL-042").unwrap().available_quantity(),
        50
    );

    // 未分配时取消分配为空操作
    assert!(state
        .allocation_api
        .deallocate("ORDER-050", "LINE-002")
        .unwrap()
        .is_none());
}

#[test]
fn test_get_allocation_coil() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-058", PRODUCT, 170, 20, 3).unwrap();
    state.order_line_api.add_line("ORDER-012", "LINE-002", PRODUCT, 52).unwrap();

    assert!(state
        .allocation_api
        .get_allocation_coil("ORDER-012", "LINE-002")
        .unwrap()
        .is_none());

    state.allocation_api.allocate("ORDER-012", "LINE-002").unwrap();
    let coil = state
        .allocation_api
        .get_allocation_coil("ORDER-012", "LINE-002")
        .unwrap()
        .unwrap();

    assert_eq!(coil.reference, "COIL-058");
    assert_eq!(coil.available_quantity(), 118);

    let err = state
        .allocation_api
        .get_allocation_coil("ORDER-404", "LINE-002")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_update_coil_deallocates_lines_that_no_longer_fit() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-051", PRODUCT_2, 100, 20, 3).unwrap();
    state.order_line_api.add_line("ORDER-052", "LINE-002", PRODUCT_2, 40).unwrap();
    state.order_line_api.add_line("ORDER-053", "LINE-001", PRODUCT_2, 35).unwrap();
    state.allocation_api.allocate("ORDER-052", "LINE-002").unwrap();
    state.allocation_api.allocate("ORDER-053", "LINE-001").unwrap();

    let result = state
        .coil_api
        .update_coil("COIL-051", PRODUCT_2, 80, 20, 3)
        .unwrap();

    let deallocated: Vec<OrderLineKey> = result.deallocated.iter().map(|l| l.key()).collect();
    assert_eq!(deallocated, vec![OrderLineKey::new("ORDER-052", "LINE-002")]);
    assert_eq!(result.coil.available_quantity(), 45);

    let saved = state.coil_api.get_coil("COIL-051").unwrap();
    assert_eq!(saved.initial_quantity, 80);
    assert_eq!(saved.available_quantity(), 45);

    let unallocated = state.order_line_api.list_unallocated_lines().unwrap();
    assert_eq!(unallocated.len(), 1);
    assert_eq!(unallocated[0].order_id, "ORDER-052");
}

#[test]
fn test_update_missing_coil() {
    let (_temp_file, state) = test_helpers::create_test_state();

    let err = state
        .coil_api
        .update_coil("COIL-404", PRODUCT, 80, 20, 3)
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_delete_coil_returns_its_lines() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-052", PRODUCT, 150, 20, 5).unwrap();
    state.order_line_api.add_line("ORDER-054", "LINE-002", PRODUCT, 50).unwrap();
    state.order_line_api.add_line("ORDER-055", "LINE-003", PRODUCT, 64).unwrap();
    state.allocation_api.allocate("ORDER-054", "LINE-002").unwrap();
    state.allocation_api.allocate("ORDER-055", "LINE-003").unwrap();

    let deallocated = state.coil_api.delete_coil("COIL-052").unwrap();

    let keys: Vec<OrderLineKey> = deallocated.iter().map(|l| l.key()).collect();
    assert_eq!(
        keys,
        vec![
            OrderLineKey::new("ORDER-054", "LINE-002"),
            OrderLineKey::new("ORDER-055", "LINE-003"),
        ]
    );
    assert!(state.coil_api.list_coils().unwrap().is_empty());
    assert_eq!(state.order_line_api.list_unallocated_lines().unwrap().len(), 2);

    let err = state.coil_api.delete_coil("COIL-052").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_update_line_reallocates_to_another_coil() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-055", PRODUCT_2, 80, 15, 2).unwrap();
    state.coil_api.add_coil("COIL-056", PRODUCT_2, 120, 15, 2).unwrap();
    state.order_line_api.add_line("ORDER-008", "LINE-002", PRODUCT_2, 24).unwrap();
    state.allocation_api.allocate("ORDER-008", "LINE-002").unwrap();

    let before = state
        .allocation_api
        .get_allocation_coil("ORDER-008", "LINE-002")
        .unwrap()
        .unwrap();
    let after = state
        .order_line_api
        .update_line("ORDER-008", "LINE-002", PRODUCT_2, 90)
        .unwrap()
        .unwrap();

    assert_eq!(before.reference, "COIL-055");
    assert_eq!(
        state.coil_api.get_coil("COIL-055").unwrap().available_quantity(),
        80
    );
    assert_eq!(after.reference, "COIL-056");
    assert_eq!(after.available_quantity(), 30);
    assert_eq!(
        state.order_line_api.get_line("ORDER-008", "LINE-002").unwrap().quantity,
        90
    );
}

#[test]
fn test_update_line_stays_on_same_coil() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-055", PRODUCT_2, 80, 15, 2).unwrap();
    state.order_line_api.add_line("ORDER-008", "LINE-002", PRODUCT_2, 24).unwrap();
    state.allocation_api.allocate("ORDER-008", "LINE-002").unwrap();

    let coil = state
        .order_line_api
        .update_line("ORDER-008", "LINE-002", PRODUCT_2, 30)
        .unwrap()
        .unwrap();

    assert_eq!(coil.reference, "COIL-055");
    assert_eq!(coil.available_quantity(), 50);
    assert_eq!(
        state.coil_api.get_coil("COIL-055").unwrap().available_quantity(),
        50
    );
}

#[test]
fn test_update_line_out_of_stock_rolls_back() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-055", PRODUCT_2, 80, 15, 2).unwrap();
    state.order_line_api.add_line("ORDER-008", "LINE-002", PRODUCT_2, 24).unwrap();
    state.allocation_api.allocate("ORDER-008", "LINE-002").unwrap();

    let err = state
        .order_line_api
        .update_line("ORDER-008", "LINE-002", PRODUCT_2, 500)
        .unwrap_err();

    assert!(matches!(err, ApiError::OutOfStock { .. }));
    assert_eq!(
        state.order_line_api.get_line("ORDER-008", "LINE-002").unwrap().quantity,
        24
    );
    let holder = state
        .allocation_api
        .get_allocation_coil("ORDER-008", "LINE-002")
        .unwrap()
        .unwrap();
    assert_eq!(holder.reference, "COIL-055");
    assert_eq!(holder.available_quantity(), 56);
}

#[test]
fn test_update_unallocated_line() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.order_line_api.add_line("ORDER-061", "LINE-001", PRODUCT, 20).unwrap();

    let holder = state
        .order_line_api
        .update_line("ORDER-061", "LINE-001", PRODUCT_2, 25)
        .unwrap();

    assert!(holder.is_none());
    let line = state.order_line_api.get_line("ORDER-061", "LINE-001").unwrap();
    assert_eq!(line.product_id, PRODUCT_2);
    assert_eq!(line.quantity, 25);
}

#[test]
fn test_delete_line_returns_former_holder() {
    let (_temp_file, state) = test_helpers::create_test_state();

    state.coil_api.add_coil("COIL-056", PRODUCT_2, 100, 15, 2).unwrap();
    state.order_line_api.add_line("ORDER-007", "LINE-004", PRODUCT_2, 24).unwrap();
    state.allocation_api.allocate("ORDER-007", "LINE-004").unwrap();

    let holder = state
        .order_line_api
        .delete_line("ORDER-007", "LINE-004")
        .unwrap()
        .unwrap();

    assert_eq!(holder.reference, "COIL-056");
    assert_eq!(
        state.coil_api.get_coil("COIL-056").unwrap().available_quantity(),
        100
    );
    assert!(state.order_line_api.list_lines().unwrap().is_empty());

    let err = state
        .order_line_api
        .delete_line("ORDER-007", "LINE-004")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
