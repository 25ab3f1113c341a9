// ==========================================
// 线盘分配系统 - 多盘选盘引擎
// ==========================================
// 职责: 在候选线盘中为订单行选择一盘并完成分配
// 策略: 最佳适配 (可用数量最少且仍满足准入规则的线盘优先)
// 输入: 订单行 + 候选线盘列表 (含当前分配)
// 输出: 被选中的线盘 (已修改) 或 OutOfStock
// ==========================================

use crate::domain::{Coil, OrderLine};
use crate::engine::error::{AllocationError, AllocationResult};
use tracing::{debug, instrument};

/// 将订单行分配到候选线盘之一
///
/// 规则:
/// 1) 幂等: 若某盘已持有同标识订单行, 直接返回该盘, 不做修改
/// 2) 选盘: 在满足 `can_allocate` 的线盘中取可用数量最小者
///    (可用数量相同时按输入顺序取第一个)
/// 3) 提交: 在选中的线盘上执行 `allocate`
/// 4) 无可用线盘: 返回 `OutOfStock`, 所有线盘保持不变
///
/// # 参数
/// - `line`: 待分配订单行
/// - `coils`: 候选线盘 (材料不一致的线盘会被自然跳过)
///
/// # 返回
/// - `Ok(&mut Coil)`: 持有该订单行的线盘
/// - `Err(AllocationError::OutOfStock)`: 没有线盘能接受该订单行
#[instrument(skip(line, coils), fields(
    order_id = %line.order_id,
    line_item = %line.line_item,
    product_id = %line.product_id,
    quantity = line.quantity,
    candidates_count = coils.len()
))]
pub fn allocate_to_list_of_coils<'a>(
    line: &OrderLine,
    coils: &'a mut [Coil],
) -> AllocationResult<&'a mut Coil> {
    let key = line.key();

    // 1. 幂等检查
    if let Some(index) = coils.iter().position(|coil| coil.holds(&key)) {
        debug!(coil = %coils[index].reference, "订单行已分配, 返回当前线盘");
        return Ok(&mut coils[index]);
    }

    // 2. 最佳适配选盘
    let selected = coils
        .iter()
        .enumerate()
        .filter(|(_, coil)| coil.can_allocate(line))
        .min_by(|(_, a), (_, b)| a.cmp_by_available(b))
        .map(|(index, _)| index);

    let Some(index) = selected else {
        debug!("没有满足准入规则的线盘");
        return Err(AllocationError::OutOfStock {
            product_id: line.product_id.clone(),
        });
    };

    // 3. 提交分配
    let coil = &mut coils[index];
    coil.allocate(line.clone());
    debug!(
        coil = %coil.reference,
        available_quantity = coil.available_quantity(),
        "订单行已分配"
    );

    Ok(coil)
}
