// ==========================================
// 线盘分配系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod coil_repo;
pub mod error;
pub mod order_line_repo;
pub mod unit_of_work;

// 重导出核心仓储
pub use coil_repo::CoilRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_line_repo::OrderLineRepository;
pub use unit_of_work::{AllocationRepositories, UnitOfWork};
