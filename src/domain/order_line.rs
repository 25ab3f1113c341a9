// ==========================================
// 线盘分配系统 - 订单行领域模型
// ==========================================
// 职责: 订单行值对象及其标识
// 红线: 标识仅由 (order_id, line_item) 决定,
//       product_id 与 quantity 不参与相等性判断
// ==========================================

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// ==========================================
// OrderLineKey - 订单行标识
// ==========================================
/// 订单行业务主键 `(order_id, line_item)`
///
/// 用作线盘分配集合的键, 也用于仓储查找
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderLineKey {
    pub order_id: String,
    pub line_item: String,
}

impl OrderLineKey {
    pub fn new(order_id: impl Into<String>, line_item: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            line_item: line_item.into(),
        }
    }
}

impl fmt::Display for OrderLineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.order_id, self.line_item)
    }
}

// ==========================================
// OrderLine - 订单行
// ==========================================
// 用途: 对某种材料的需求数量
// 生命周期: 由调用方根据持久化数据或用户输入创建, 引擎不做修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,   // 订单号
    pub line_item: String,  // 订单行号
    pub product_id: String, // 材料标识
    pub quantity: i64,      // 需求数量
}

impl OrderLine {
    /// 创建订单行
    ///
    /// 不做任何校验, 格式校验属于 API 层职责
    pub fn new(
        order_id: impl Into<String>,
        line_item: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            line_item: line_item.into(),
            product_id: product_id.into(),
            quantity,
        }
    }

    /// 订单行标识
    pub fn key(&self) -> OrderLineKey {
        OrderLineKey::new(self.order_id.as_str(), self.line_item.as_str())
    }

    /// 是否与给定标识相同
    pub fn has_key(&self, key: &OrderLineKey) -> bool {
        self.order_id == key.order_id && self.line_item == key.line_item
    }
}

impl PartialEq for OrderLine {
    fn eq(&self, other: &Self) -> bool {
        self.order_id == other.order_id && self.line_item == other.line_item
    }
}

impl Eq for OrderLine {}

impl Hash for OrderLine {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.order_id.hash(state);
        self.line_item.hash(state);
    }
}

impl PartialOrd for OrderLine {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// 与相等性保持一致: 只按标识排序
impl Ord for OrderLine {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.order_id.as_str(), self.line_item.as_str())
            .cmp(&(other.order_id.as_str(), other.line_item.as_str()))
    }
}
