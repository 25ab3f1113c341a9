// ==========================================
// 线盘分配系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 分配引擎错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// 候选线盘中没有任何一盘满足准入规则
    ///
    /// 终止信号, 引擎内部不重试
    #[error("材料库存不足: product_id={product_id}")]
    OutOfStock { product_id: String },
}

/// Result 类型别名
pub type AllocationResult<T> = Result<T, AllocationError>;
