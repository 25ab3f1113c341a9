// ==========================================
// 线盘分配系统 - API 数据传输对象
// ==========================================
// 职责: 供调用方渲染 JSON 的只读视图
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::{Coil, OrderLine};

/// 订单行视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineView {
    pub order_id: String,
    pub line_item: String,
    pub product_id: String,
    pub quantity: i64,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            order_id: line.order_id.clone(),
            line_item: line.line_item.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        }
    }
}

/// 线盘视图（含派生数量与分配明细）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoilView {
    pub reference: String,
    pub product_id: String,
    pub initial_quantity: i64,
    pub recommended_balance: i64,
    pub acceptable_loss: i64,
    pub allocated_quantity: i64,
    pub available_quantity: i64,
    pub allocations: Vec<OrderLineView>,
}

impl From<&Coil> for CoilView {
    fn from(coil: &Coil) -> Self {
        Self {
            reference: coil.reference.clone(),
            product_id: coil.product_id.clone(),
            initial_quantity: coil.initial_quantity,
            recommended_balance: coil.recommended_balance,
            acceptable_loss: coil.acceptable_loss,
            allocated_quantity: coil.allocated_quantity(),
            available_quantity: coil.available_quantity(),
            allocations: coil.allocations().map(OrderLineView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coil_view_json() {
        let mut coil = Coil::new("COIL-001", "AVVG-2x6", 100, 5, 1);
        coil.allocate(OrderLine::new("ORDER-001", "LINE-001", "AVVG-2x6", 30));

        let view = CoilView::from(&coil);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["allocated_quantity"], 30);
        assert_eq!(json["available_quantity"], 70);
        assert_eq!(json["allocations"][0]["order_id"], "ORDER-001");
    }
}
