// ==========================================
// 线盘分配系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::{AllocationApi, CoilApi, InputValidator, OrderLineApi};
use crate::config::ConfigManager;
use crate::engine::{AllocationEventPublisher, OptionalEventPublisher};
use crate::repository::UnitOfWork;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "COIL_ALLOCATION_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 线盘API
    pub coil_api: Arc<CoilApi>,

    /// 订单行API
    pub order_line_api: Arc<OrderLineApi>,

    /// 分配API
    pub allocation_api: Arc<AllocationApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例（不发布事件）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::build(db_path, OptionalEventPublisher::none())
    }

    /// 创建带事件发布者的AppState实例
    pub fn with_publisher(
        db_path: String,
        publisher: Arc<dyn AllocationEventPublisher>,
    ) -> Result<Self, String> {
        Self::build(db_path, OptionalEventPublisher::with_publisher(publisher))
    }

    fn build(db_path: String, event_publisher: OptionalEventPublisher) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(conn));

        // 配置管理器与输入校验器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let patterns = config_manager
            .validation_patterns()
            .map_err(|e| format!("无法读取校验规则: {}", e))?;
        let validator = Arc::new(
            InputValidator::new(&patterns).map_err(|e| format!("校验规则无效: {}", e))?,
        );

        // 所有API共享同一工作单元与事件发布者
        let uow = UnitOfWork::new(conn);
        let coil_api = Arc::new(CoilApi::new(
            uow.clone(),
            validator.clone(),
            event_publisher.clone(),
        ));
        let order_line_api = Arc::new(OrderLineApi::new(
            uow.clone(),
            validator.clone(),
            event_publisher.clone(),
        ));
        let allocation_api = Arc::new(AllocationApi::new(uow, validator, event_publisher));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            coil_api,
            order_line_api,
            allocation_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 COIL_ALLOCATION_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./coil_allocation.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("coil-allocation");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("coil_allocation.db");
        }
    }

    path.to_string_lossy().to_string()
}
