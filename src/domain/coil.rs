// ==========================================
// 线盘分配系统 - 线盘领域模型
// ==========================================
// 职责: 线盘实体、单盘准入规则、重分配模拟
// 红线: 引擎永远不接受 can_allocate 判定为 false 的订单行
// ==========================================

use crate::domain::order_line::{OrderLine, OrderLineKey};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

// ==========================================
// Coil - 线盘
// ==========================================
// 用途: 持有单一材料的有限数量, 累积已分配的订单行
// 标识: reference
#[derive(Debug, Clone)]
pub struct Coil {
    // ===== 主键 =====
    pub reference: String, // 线盘编号

    // ===== 材料与容量 =====
    pub product_id: String,    // 材料标识
    pub initial_quantity: i64, // 初始数量

    // ===== 准入策略参数 =====
    pub recommended_balance: i64, // 推荐余量 (分配后剩余 >= 此值视为健康)
    pub acceptable_loss: i64,     // 可接受损耗 (分配后剩余 <= 此值可报废)

    // ===== 已分配订单行 =====
    // 按订单行标识去重, clone 为深拷贝
    allocations: BTreeMap<OrderLineKey, OrderLine>,
}

impl Coil {
    /// 创建线盘（无分配）
    pub fn new(
        reference: impl Into<String>,
        product_id: impl Into<String>,
        initial_quantity: i64,
        recommended_balance: i64,
        acceptable_loss: i64,
    ) -> Self {
        Self {
            reference: reference.into(),
            product_id: product_id.into(),
            initial_quantity,
            recommended_balance,
            acceptable_loss,
            allocations: BTreeMap::new(),
        }
    }

    /// 从持久化数据重建线盘
    ///
    /// 分配记录按原样恢复, 不经过准入规则检查。
    /// 同一标识出现多次时保留最后一条。
    pub fn from_parts(
        reference: impl Into<String>,
        product_id: impl Into<String>,
        initial_quantity: i64,
        recommended_balance: i64,
        acceptable_loss: i64,
        allocations: impl IntoIterator<Item = OrderLine>,
    ) -> Self {
        let mut coil = Self::new(
            reference,
            product_id,
            initial_quantity,
            recommended_balance,
            acceptable_loss,
        );
        coil.allocations = allocations
            .into_iter()
            .map(|line| (line.key(), line))
            .collect();
        coil
    }

    // ==========================================
    // 派生数量
    // ==========================================

    /// 已分配数量
    pub fn allocated_quantity(&self) -> i64 {
        self.allocations.values().map(|line| line.quantity).sum()
    }

    /// 可用数量（可能为负, 仅当恢复的分配已超出容量时）
    pub fn available_quantity(&self) -> i64 {
        self.initial_quantity - self.allocated_quantity()
    }

    // ==========================================
    // 单盘准入规则
    // ==========================================

    /// 判断订单行能否分配到本线盘
    ///
    /// 规则:
    /// 1) 材料必须一致
    /// 2) 分配后剩余 >= recommended_balance, 或
    ///    0 <= 分配后剩余 <= acceptable_loss
    ///
    /// 剩余量严格介于 acceptable_loss 与 recommended_balance 之间时拒绝。
    /// 所有边界均为闭区间。
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        if self.product_id != line.product_id {
            return false;
        }

        let remainder = self.available_quantity() - line.quantity;
        remainder >= self.recommended_balance
            || (0..=self.acceptable_loss).contains(&remainder)
    }

    /// 分配订单行
    ///
    /// # 返回
    /// - `true`: 调用后订单行由本线盘持有（包括此前已持有的情况）
    /// - `false`: 不满足准入规则, 未做任何修改
    pub fn allocate(&mut self, line: OrderLine) -> bool {
        let key = line.key();
        if self.allocations.contains_key(&key) {
            return true;
        }
        if !self.can_allocate(&line) {
            return false;
        }
        self.allocations.insert(key, line);
        true
    }

    /// 取消分配订单行（按标识）, 未持有时为空操作
    pub fn deallocate(&mut self, line: &OrderLine) -> Option<OrderLine> {
        self.deallocate_by_key(&line.key())
    }

    /// 按订单行标识取消分配
    pub fn deallocate_by_key(&mut self, key: &OrderLineKey) -> Option<OrderLine> {
        self.allocations.remove(key)
    }

    // ==========================================
    // 分配查询
    // ==========================================

    /// 是否持有指定订单行
    pub fn holds(&self, key: &OrderLineKey) -> bool {
        self.allocations.contains_key(key)
    }

    /// 获取已分配的订单行
    pub fn allocation(&self, key: &OrderLineKey) -> Option<&OrderLine> {
        self.allocations.get(key)
    }

    /// 已分配订单行（按标识排序）
    pub fn allocations(&self) -> impl Iterator<Item = &OrderLine> + '_ {
        self.allocations.values()
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.len()
    }

    /// 用给定集合替换全部分配（不做准入检查）
    pub fn replace_allocations(&mut self, lines: impl IntoIterator<Item = OrderLine>) {
        self.allocations = lines.into_iter().map(|line| (line.key(), line)).collect();
    }

    /// 拆出全部已分配订单行
    pub fn into_allocations(self) -> Vec<OrderLine> {
        self.allocations.into_values().collect()
    }

    /// 按可用数量升序比较（选盘策略使用）
    ///
    /// 与 `PartialEq` 无关: 相等性只看 reference
    pub fn cmp_by_available(&self, other: &Coil) -> Ordering {
        self.available_quantity().cmp(&other.available_quantity())
    }

    // ==========================================
    // 重分配模拟
    // ==========================================

    /// 计算在候选配置下仍能保留的订单行
    ///
    /// 在 `candidate` 的独立副本上, 按数量从小到大依次尝试分配
    /// 本线盘当前的订单行, 返回副本最终持有的订单行。
    /// 不修改 `self`。
    ///
    /// 调用方用 `当前分配 − 返回结果` 得到被取消分配的订单行。
    pub fn reallocate(&self, candidate: &Coil) -> BTreeSet<OrderLine> {
        let mut scratch = candidate.clone();

        let mut lines: Vec<&OrderLine> = self.allocations.values().collect();
        // 稳定排序: 数量相同时保持标识顺序
        lines.sort_by_key(|line| line.quantity);

        for line in lines {
            scratch.allocate(line.clone());
        }

        scratch.allocations.into_values().collect()
    }
}

impl PartialEq for Coil {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Coil {}

impl Hash for Coil {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}
