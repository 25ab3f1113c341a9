// ==========================================
// 线盘分配系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 负责输入校验、事务边界与事件发布
// ==========================================

pub mod allocation_api;
pub mod coil_api;
pub mod dto;
pub mod error;
pub mod order_line_api;
pub mod validator;

// 重导出核心类型
pub use allocation_api::AllocationApi;
pub use coil_api::{CoilApi, CoilUpdateResult};
pub use dto::{CoilView, OrderLineView};
pub use error::{ApiError, ApiResult};
pub use order_line_api::OrderLineApi;
pub use validator::InputValidator;
