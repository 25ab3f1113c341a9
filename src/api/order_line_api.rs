// ==========================================
// 线盘分配系统 - 订单行 API
// ==========================================
// 职责: 订单行的增删改查
// 说明: 已分配订单行变更后在全部线盘中重新择优分配,
//       找不到线盘时整个操作回滚
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::InputValidator;
use crate::domain::{Coil, OrderLine, OrderLineKey};
use crate::engine::allocation::allocate_to_list_of_coils;
use crate::engine::events::{AllocationEvent, AllocationEventType, OptionalEventPublisher};
use crate::repository::{RepositoryError, UnitOfWork};

// ==========================================
// OrderLineApi - 订单行 API
// ==========================================
pub struct OrderLineApi {
    uow: UnitOfWork,
    validator: Arc<InputValidator>,
    event_publisher: OptionalEventPublisher,
}

impl OrderLineApi {
    pub fn new(
        uow: UnitOfWork,
        validator: Arc<InputValidator>,
        event_publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            uow,
            validator,
            event_publisher,
        }
    }

    /// 新增订单行（不分配）
    pub fn add_line(
        &self,
        order_id: &str,
        line_item: &str,
        product_id: &str,
        quantity: i64,
    ) -> ApiResult<OrderLine> {
        self.validator
            .validate_line(order_id, line_item, product_id, quantity)?;

        let line = OrderLine::new(order_id, line_item, product_id, quantity);
        self.uow.run(|repos| repos.lines.insert(&line))?;

        info!(line = %line.key(), product_id = product_id, quantity = quantity, "订单行已新增");
        Ok(line)
    }

    /// 查询订单行
    pub fn get_line(&self, order_id: &str, line_item: &str) -> ApiResult<OrderLine> {
        self.validator.validate_line_key(order_id, line_item)?;

        let key = OrderLineKey::new(order_id, line_item);
        self.uow
            .run(|repos| repos.lines.find_by_key(&key))?
            .ok_or_else(|| ApiError::NotFound(format!("OrderLine(id={})不存在", key)))
    }

    /// 查询全部订单行
    pub fn list_lines(&self) -> ApiResult<Vec<OrderLine>> {
        Ok(self.uow.run(|repos| repos.lines.list_all())?)
    }

    /// 查询未分配的订单行
    pub fn list_unallocated_lines(&self) -> ApiResult<Vec<OrderLine>> {
        let lines = self.uow.run(|repos| repos.lines.list_unallocated())?;
        debug!(count = lines.len(), "查询未分配订单行");
        Ok(lines)
    }

    /// 变更订单行
    ///
    /// # 返回
    /// - Ok(Some(Coil)): 订单行原已分配, 返回重新分配后的线盘
    /// - Ok(None): 订单行未分配, 仅更新记录
    /// - Err(OutOfStock): 已分配订单行找不到新线盘, 变更整体回滚
    pub fn update_line(
        &self,
        order_id: &str,
        line_item: &str,
        product_id: &str,
        quantity: i64,
    ) -> ApiResult<Option<Coil>> {
        self.validator
            .validate_line(order_id, line_item, product_id, quantity)?;

        let updated = OrderLine::new(order_id, line_item, product_id, quantity);
        let key = updated.key();

        let moved = self.uow.run(|repos| -> ApiResult<Option<(String, Coil)>> {
            repos.lines.update(&updated)?;

            let Some(previous) = repos.coils.find_by_allocated_line(&key)? else {
                return Ok(None);
            };

            let mut coils = repos.coils.list_all()?;
            for coil in coils.iter_mut().filter(|c| c.reference == previous.reference) {
                coil.deallocate_by_key(&key);
            }

            let chosen = allocate_to_list_of_coils(&updated, &mut coils)?.clone();

            // 先释放原线盘, 再写入新线盘, 避免分配主键冲突
            if chosen.reference != previous.reference {
                let released = coils
                    .iter()
                    .find(|c| c.reference == previous.reference)
                    .ok_or_else(|| RepositoryError::not_found("Coil", previous.reference.as_str()))?;
                repos.coils.save(released)?;
            }
            repos.coils.save(&chosen)?;

            debug!(
                line = %key,
                from = %previous.reference,
                to = %chosen.reference,
                "订单行已重新分配"
            );
            Ok(Some((previous.reference, chosen)))
        })?;

        let holder = match moved {
            Some((previous, chosen)) => {
                if previous != chosen.reference {
                    self.event_publisher.publish(AllocationEvent::lines_deallocated(
                        &previous,
                        std::slice::from_ref(&updated),
                    ));
                    self.event_publisher
                        .publish(AllocationEvent::line_allocated(&chosen.reference, &updated));
                }
                Some(chosen)
            }
            None => None,
        };

        self.event_publisher.publish(AllocationEvent::line(
            AllocationEventType::LineUpdated,
            key.clone(),
            holder.as_ref().map(|c| c.reference.clone()),
        ));

        info!(line = %key, quantity = quantity, "订单行已更新");
        Ok(holder)
    }

    /// 删除订单行
    ///
    /// # 返回
    /// - Ok(Some(Coil)): 删除前持有该订单行的线盘（已释放）
    /// - Ok(None): 订单行未分配
    /// - Err(NotFound): 订单行不存在
    pub fn delete_line(&self, order_id: &str, line_item: &str) -> ApiResult<Option<Coil>> {
        self.validator.validate_line_key(order_id, line_item)?;

        let key = OrderLineKey::new(order_id, line_item);
        let holder = self.uow.run(|repos| -> ApiResult<Option<Coil>> {
            let holder = match repos.coils.find_by_allocated_line(&key)? {
                Some(mut coil) => {
                    coil.deallocate_by_key(&key);
                    repos.coils.save(&coil)?;
                    Some(coil)
                }
                None => None,
            };

            if !repos.lines.delete(&key)? {
                return Err(RepositoryError::not_found("OrderLine", key.to_string()).into());
            }
            Ok(holder)
        })?;

        self.event_publisher.publish(AllocationEvent::line(
            AllocationEventType::LineDeleted,
            key.clone(),
            holder.as_ref().map(|c| c.reference.clone()),
        ));

        info!(line = %key, "订单行已删除");
        Ok(holder)
    }
}
