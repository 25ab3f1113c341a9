// ==========================================
// 线盘分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、单盘准入规则
// 红线: 不含数据访问逻辑, 不做任何 I/O
// ==========================================

pub mod coil;
pub mod order_line;

// 重导出核心类型
pub use coil::Coil;
pub use order_line::{OrderLine, OrderLineKey};
