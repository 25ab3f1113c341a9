// ==========================================
// 线盘分配系统 - 线盘数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 只做数据映射
// 说明: 分配关系存于 allocation 表, 读取线盘时一并恢复
// ==========================================

use crate::domain::{Coil, OrderLine, OrderLineKey};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::HashMap;

const ENTITY: &str = "Coil";

/// 线盘行（不含分配）
struct CoilRow {
    reference: String,
    product_id: String,
    initial_quantity: i64,
    recommended_balance: i64,
    acceptable_loss: i64,
}

impl CoilRow {
    fn into_coil(self, allocations: Vec<OrderLine>) -> Coil {
        Coil::from_parts(
            self.reference,
            self.product_id,
            self.initial_quantity,
            self.recommended_balance,
            self.acceptable_loss,
            allocations,
        )
    }
}

fn map_coil_row(row: &rusqlite::Row<'_>) -> SqliteResult<CoilRow> {
    Ok(CoilRow {
        reference: row.get(0)?,
        product_id: row.get(1)?,
        initial_quantity: row.get(2)?,
        recommended_balance: row.get(3)?,
        acceptable_loss: row.get(4)?,
    })
}

// ==========================================
// CoilRepository - 线盘仓储
// ==========================================
/// 线盘仓储
/// 职责: 管理 coil 表与 allocation 表的读写
/// 连接由调用方提供（通常是 UnitOfWork 中的事务）
pub struct CoilRepository<'c> {
    conn: &'c Connection,
}

impl<'c> CoilRepository<'c> {
    /// 基于已有连接/事务创建仓储
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入线盘（连同其分配关系）
    ///
    /// # 返回
    /// - `Err(AlreadyExists)`: reference 已存在
    pub fn insert(&self, coil: &Coil) -> RepositoryResult<()> {
        if self.exists(&coil.reference)? {
            return Err(RepositoryError::already_exists(ENTITY, coil.reference.as_str()));
        }

        self.conn.execute(
            r#"
            INSERT INTO coil (
                reference, product_id, initial_quantity,
                recommended_balance, acceptable_loss
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                coil.reference,
                coil.product_id,
                coil.initial_quantity,
                coil.recommended_balance,
                coil.acceptable_loss,
            ],
        )?;

        self.write_allocations(coil)
    }

    /// 保存线盘（更新参数并重写分配关系）
    ///
    /// # 返回
    /// - `Err(NotFound)`: 线盘不存在
    /// - `Err(UniqueConstraintViolation)`: 某订单行仍被其他线盘持有
    pub fn save(&self, coil: &Coil) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE coil
            SET product_id = ?2,
                initial_quantity = ?3,
                recommended_balance = ?4,
                acceptable_loss = ?5
            WHERE reference = ?1
            "#,
            params![
                coil.reference,
                coil.product_id,
                coil.initial_quantity,
                coil.recommended_balance,
                coil.acceptable_loss,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found(ENTITY, coil.reference.as_str()));
        }

        self.conn.execute(
            "DELETE FROM allocation WHERE coil_reference = ?1",
            params![coil.reference],
        )?;

        self.write_allocations(coil)
    }

    /// 删除线盘
    ///
    /// # 返回
    /// - `Ok(Some(Coil))`: 被删除的线盘（含删除前的分配）
    /// - `Ok(None)`: 线盘不存在
    pub fn delete(&self, reference: &str) -> RepositoryResult<Option<Coil>> {
        let Some(coil) = self.find_by_reference(reference)? else {
            return Ok(None);
        };

        // allocation 行随外键级联删除
        self.conn
            .execute("DELETE FROM coil WHERE reference = ?1", params![reference])?;

        Ok(Some(coil))
    }

    fn write_allocations(&self, coil: &Coil) -> RepositoryResult<()> {
        if coil.allocation_count() == 0 {
            return Ok(());
        }

        let mut stmt = self.conn.prepare(
            "INSERT INTO allocation (coil_reference, order_id, line_item) VALUES (?1, ?2, ?3)",
        )?;
        for line in coil.allocations() {
            stmt.execute(params![coil.reference, line.order_id, line.line_item])?;
        }

        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 线盘是否存在
    pub fn exists(&self, reference: &str) -> RepositoryResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM coil WHERE reference = ?1",
                params![reference],
                |_row| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 按 reference 查询线盘（含分配）
    pub fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Coil>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT reference, product_id, initial_quantity,
                       recommended_balance, acceptable_loss
                FROM coil
                WHERE reference = ?1
                "#,
                params![reference],
                map_coil_row,
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT ol.order_id, ol.line_item, ol.product_id, ol.quantity
            FROM allocation a
            JOIN order_line ol
              ON ol.order_id = a.order_id AND ol.line_item = a.line_item
            WHERE a.coil_reference = ?1
            ORDER BY ol.order_id, ol.line_item
            "#,
        )?;
        let allocations = stmt
            .query_map(params![reference], |row| {
                Ok(OrderLine::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<SqliteResult<Vec<OrderLine>>>()?;

        Ok(Some(row.into_coil(allocations)))
    }

    /// 查询全部线盘（含分配, 按 reference 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Coil>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.coil_reference, ol.order_id, ol.line_item, ol.product_id, ol.quantity
            FROM allocation a
            JOIN order_line ol
              ON ol.order_id = a.order_id AND ol.line_item = a.line_item
            "#,
        )?;
        let mut allocations: HashMap<String, Vec<OrderLine>> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                OrderLine::new(
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ),
            ))
        })?;
        for row in rows {
            let (reference, line) = row?;
            allocations.entry(reference).or_default().push(line);
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT reference, product_id, initial_quantity,
                   recommended_balance, acceptable_loss
            FROM coil
            ORDER BY reference
            "#,
        )?;
        let coils = stmt
            .query_map([], map_coil_row)?
            .collect::<SqliteResult<Vec<CoilRow>>>()?
            .into_iter()
            .map(|row| {
                let lines = allocations.remove(&row.reference).unwrap_or_default();
                row.into_coil(lines)
            })
            .collect();

        Ok(coils)
    }

    /// 查询持有指定订单行的线盘
    pub fn find_by_allocated_line(&self, key: &OrderLineKey) -> RepositoryResult<Option<Coil>> {
        let reference: Option<String> = self
            .conn
            .query_row(
                "SELECT coil_reference FROM allocation WHERE order_id = ?1 AND line_item = ?2",
                params![key.order_id, key.line_item],
                |row| row.get(0),
            )
            .optional()?;

        match reference {
            Some(reference) => self.find_by_reference(&reference),
            None => Ok(None),
        }
    }
}
