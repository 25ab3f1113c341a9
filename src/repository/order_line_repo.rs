// ==========================================
// 线盘分配系统 - 订单行数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 只做数据映射
// ==========================================

use crate::domain::{OrderLine, OrderLineKey};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

const ENTITY: &str = "OrderLine";

fn map_line_row(row: &rusqlite::Row<'_>) -> SqliteResult<OrderLine> {
    Ok(OrderLine::new(
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, i64>(3)?,
    ))
}

// ==========================================
// OrderLineRepository - 订单行仓储
// ==========================================
pub struct OrderLineRepository<'c> {
    conn: &'c Connection,
}

impl<'c> OrderLineRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 插入订单行
    ///
    /// # 返回
    /// - `Err(AlreadyExists)`: (order_id, line_item) 已存在
    pub fn insert(&self, line: &OrderLine) -> RepositoryResult<()> {
        if self.find_by_key(&line.key())?.is_some() {
            return Err(RepositoryError::already_exists(ENTITY, line.key().to_string()));
        }

        self.conn.execute(
            "INSERT INTO order_line (order_id, line_item, product_id, quantity) VALUES (?1, ?2, ?3, ?4)",
            params![line.order_id, line.line_item, line.product_id, line.quantity],
        )?;
        Ok(())
    }

    /// 更新订单行的材料与数量
    pub fn update(&self, line: &OrderLine) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE order_line
            SET product_id = ?3, quantity = ?4
            WHERE order_id = ?1 AND line_item = ?2
            "#,
            params![line.order_id, line.line_item, line.product_id, line.quantity],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found(ENTITY, line.key().to_string()));
        }
        Ok(())
    }

    /// 删除订单行（分配关系随外键级联删除）
    ///
    /// # 返回
    /// - `Ok(true)`: 已删除
    /// - `Ok(false)`: 订单行不存在
    pub fn delete(&self, key: &OrderLineKey) -> RepositoryResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM order_line WHERE order_id = ?1 AND line_item = ?2",
            params![key.order_id, key.line_item],
        )?;
        Ok(affected > 0)
    }

    pub fn find_by_key(&self, key: &OrderLineKey) -> RepositoryResult<Option<OrderLine>> {
        let line = self
            .conn
            .query_row(
                r#"
                SELECT order_id, line_item, product_id, quantity
                FROM order_line
                WHERE order_id = ?1 AND line_item = ?2
                "#,
                params![key.order_id, key.line_item],
                map_line_row,
            )
            .optional()?;
        Ok(line)
    }

    /// 查询全部订单行（按标识排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<OrderLine>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT order_id, line_item, product_id, quantity
            FROM order_line
            ORDER BY order_id, line_item
            "#,
        )?;
        let lines = stmt
            .query_map([], map_line_row)?
            .collect::<SqliteResult<Vec<OrderLine>>>()?;
        Ok(lines)
    }

    /// 查询尚未分配到任何线盘的订单行
    pub fn list_unallocated(&self) -> RepositoryResult<Vec<OrderLine>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT ol.order_id, ol.line_item, ol.product_id, ol.quantity
            FROM order_line ol
            LEFT JOIN allocation a
              ON a.order_id = ol.order_id AND a.line_item = ol.line_item
            WHERE a.coil_reference IS NULL
            ORDER BY ol.order_id, ol.line_item
            "#,
        )?;
        let lines = stmt
            .query_map([], map_line_row)?
            .collect::<SqliteResult<Vec<OrderLine>>>()?;
        Ok(lines)
    }
}
