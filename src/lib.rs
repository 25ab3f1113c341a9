// ==========================================
// 线盘分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 订单行到线盘的分配引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与值对象
pub mod domain;

// 引擎层 - 分配规则（纯内存）
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{Coil, OrderLine, OrderLineKey};

// 引擎
pub use engine::{
    allocate_to_list_of_coils, plan_coil_update, AllocationError, AllocationEvent,
    AllocationEventPublisher, AllocationEventType, CoilUpdatePlan,
};

// API
pub use api::{AllocationApi, ApiError, ApiResult, CoilApi, OrderLineApi};

// 应用
pub use app::{get_default_db_path, AppState};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "线盘分配系统";
