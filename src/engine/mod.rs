// ==========================================
// 线盘分配系统 - 引擎层
// ==========================================
// 职责: 实现分配规则, 纯内存计算
// 红线: Engine 不拼 SQL, 不做 I/O, 不加锁
// ==========================================

pub mod allocation;
pub mod error;
pub mod events;
pub mod reallocation;

// 重导出核心引擎
pub use allocation::allocate_to_list_of_coils;
pub use error::{AllocationError, AllocationResult};
pub use events::{
    AllocationEvent, AllocationEventPublisher, AllocationEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use reallocation::{plan_coil_update, CoilUpdatePlan};
