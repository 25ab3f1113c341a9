// ==========================================
// 线盘分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 全局作用域标识
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ValidationPatterns - 标识格式规则
// ==========================================
/// 输入标识的正则规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPatterns {
    pub coil_reference: String,
    pub order_id: String,
    pub line_item: String,
}

impl Default for ValidationPatterns {
    fn default() -> Self {
        Self {
            coil_reference: defaults::COIL_REFERENCE_PATTERN.to_string(),
            order_id: defaults::ORDER_ID_PATTERN.to_string(),
            line_item: defaults::LINE_ITEM_PATTERN.to_string(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        // 使用UPSERT语法（SQLite 3.24.0+）
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;

        tracing::info!(key = key, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON格式, 按键排序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 输入校验配置 =====

    /// 获取标识格式规则
    ///
    /// 未配置的键使用默认规则
    pub fn validation_patterns(&self) -> Result<ValidationPatterns, Box<dyn Error>> {
        Ok(ValidationPatterns {
            coil_reference: self.get_config_or_default(
                config_keys::VALIDATION_COIL_REFERENCE_PATTERN,
                defaults::COIL_REFERENCE_PATTERN,
            )?,
            order_id: self.get_config_or_default(
                config_keys::VALIDATION_ORDER_ID_PATTERN,
                defaults::ORDER_ID_PATTERN,
            )?,
            line_item: self.get_config_or_default(
                config_keys::VALIDATION_LINE_ITEM_PATTERN,
                defaults::LINE_ITEM_PATTERN,
            )?,
        })
    }
}

mod defaults {
    pub const COIL_REFERENCE_PATTERN: &str = "^COIL-";
    pub const ORDER_ID_PATTERN: &str = "^ORDER-";
    pub const LINE_ITEM_PATTERN: &str = "^LINE-";
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 输入校验
    pub const VALIDATION_COIL_REFERENCE_PATTERN: &str = "validation_coil_reference_pattern";
    pub const VALIDATION_ORDER_ID_PATTERN: &str = "validation_order_id_pattern";
    pub const VALIDATION_LINE_ITEM_PATTERN: &str = "validation_line_item_pattern";
}
