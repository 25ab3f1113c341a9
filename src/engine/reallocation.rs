// ==========================================
// 线盘分配系统 - 线盘变更重分配
// ==========================================
// 职责: 线盘容量/策略参数变更时, 计算保留与被取消的订单行
// 输入: 当前线盘 (含分配) + 候选配置 (无分配)
// 输出: 带保留分配的新线盘 + 被取消分配的订单行
// ==========================================

use crate::domain::{Coil, OrderLine};
use tracing::{debug, instrument};

/// 线盘变更计划
#[derive(Debug, Clone)]
pub struct CoilUpdatePlan {
    /// 候选配置, 携带仍能保留的订单行
    pub coil: Coil,
    /// 变更后不再分配的订单行（按标识排序）
    pub deallocated: Vec<OrderLine>,
}

impl CoilUpdatePlan {
    pub fn has_deallocations(&self) -> bool {
        !self.deallocated.is_empty()
    }
}

/// 计算线盘变更计划
///
/// 以 `current.reallocate(&candidate)` 的结果作为新分配,
/// 差集 `current.allocations − 保留集合` 即为被取消的订单行。
/// 不修改 `current`。
#[instrument(skip(current, candidate), fields(
    reference = %current.reference,
    current_allocations = current.allocation_count(),
    new_quantity = candidate.initial_quantity
))]
pub fn plan_coil_update(current: &Coil, mut candidate: Coil) -> CoilUpdatePlan {
    let retained = current.reallocate(&candidate);

    let deallocated: Vec<OrderLine> = current
        .allocations()
        .filter(|line| !retained.contains(*line))
        .cloned()
        .collect();

    candidate.replace_allocations(retained);

    debug!(
        retained = candidate.allocation_count(),
        deallocated = deallocated.len(),
        "线盘变更计划已生成"
    );

    CoilUpdatePlan {
        coil: candidate,
        deallocated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = "AVVG-2x2.5";

    #[test]
    fn test_capacity_decrease_deallocates_line() {
        let mut current = Coil::new("COIL-051", PRODUCT, 100, 20, 3);
        current.allocate(OrderLine::new("ORDER-052", "LINE-002", PRODUCT, 40));
        current.allocate(OrderLine::new("ORDER-053", "LINE-001", PRODUCT, 35));
        let candidate = Coil::new("COIL-051", PRODUCT, 80, 20, 3);

        let plan = plan_coil_update(&current, candidate);

        // 35 先入: 80-35=45; 再 40: 剩 5, 落在 (3, 20) 之间被拒绝
        assert_eq!(plan.coil.available_quantity(), 45);
        assert_eq!(plan.deallocated.len(), 1);
        assert_eq!(plan.deallocated[0].order_id, "ORDER-052");
        assert!(plan.has_deallocations());
        // 原线盘不变
        assert_eq!(current.available_quantity(), 25);
    }

    #[test]
    fn test_unchanged_parameters_keep_everything() {
        let mut current = Coil::new("COIL-001", PRODUCT, 150, 20, 5);
        current.allocate(OrderLine::new("ORDER-054", "LINE-002", PRODUCT, 50));
        current.allocate(OrderLine::new("ORDER-055", "LINE-003", PRODUCT, 64));

        let plan = plan_coil_update(&current, Coil::new("COIL-001", PRODUCT, 150, 20, 5));

        assert!(!plan.has_deallocations());
        assert_eq!(plan.coil.allocation_count(), 2);
        assert_eq!(plan.coil.available_quantity(), 36);
    }

    #[test]
    fn test_product_change_deallocates_all() {
        let mut current = Coil::new("COIL-001", PRODUCT, 150, 20, 5);
        current.allocate(OrderLine::new("ORDER-054", "LINE-002", PRODUCT, 50));

        let plan = plan_coil_update(&current, Coil::new("COIL-001", "AVVG-2x6", 150, 20, 5));

        assert_eq!(plan.coil.allocation_count(), 0);
        assert_eq!(plan.deallocated.len(), 1);
    }
}
