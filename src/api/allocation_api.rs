// ==========================================
// 线盘分配系统 - 分配 API
// ==========================================
// 职责: 订单行分配、取消分配、查询所在线盘
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::InputValidator;
use crate::domain::{Coil, OrderLine, OrderLineKey};
use crate::engine::allocation::allocate_to_list_of_coils;
use crate::engine::events::{AllocationEvent, OptionalEventPublisher};
use crate::repository::{AllocationRepositories, RepositoryError, UnitOfWork};

// ==========================================
// AllocationApi - 分配 API
// ==========================================
pub struct AllocationApi {
    uow: UnitOfWork,
    validator: Arc<InputValidator>,
    event_publisher: OptionalEventPublisher,
}

impl AllocationApi {
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

    /// 分配订单行
    ///
    /// 在全部线盘中选择满足准入规则且剩余量最小的一盘。
    /// 订单行已分配时直接返回其所在线盘。
    ///
    /// # 返回
    /// - Ok(Coil): 持有该订单行的线盘
    /// - Err(NotFound): 订单行不存在
    /// - Err(OutOfStock): 没有线盘能容纳该订单行
    pub fn allocate(&self, order_id: &str, line_item: &str) -> ApiResult<Coil> {
        self.validator.validate_line_key(order_id, line_item)?;

        let key = OrderLineKey::new(order_id, line_item);
        let (coil, newly_allocated) = self.uow.run(|repos| -> ApiResult<(Coil, bool)> {
            let line = repos
                .lines
                .find_by_key(&key)?
                .ok_or_else(|| RepositoryError::not_found("OrderLine", key.to_string()))?;

            let mut coils = repos.coils.list_all()?;
            let already_allocated = coils.iter().any(|c| c.holds(&key));

            let chosen = allocate_to_list_of_coils(&line, &mut coils)?;
            if !already_allocated {
                repos.coils.save(chosen)?;
            }
            Ok((chosen.clone(), !already_allocated))
        })?;

        if newly_allocated {
            if let Some(line) = coil.allocation(&key) {
                self.event_publisher
                    .publish(AllocationEvent::line_allocated(&coil.reference, line));
            }
            info!(
                line = %key,
                reference = %coil.reference,
                available = coil.available_quantity(),
                "订单行已分配"
            );
        }

        Ok(coil)
    }

    /// 取消分配订单行
    ///
    /// # 返回
    /// - Ok(Some(Coil)): 原持有线盘（已释放）
    /// - Ok(None): 订单行未分配
    /// - Err(NotFound): 订单行不存在
    pub fn deallocate(&self, order_id: &str, line_item: &str) -> ApiResult<Option<Coil>> {
        self.validator.validate_line_key(order_id, line_item)?;

        let key = OrderLineKey::new(order_id, line_item);
        let released = self.uow.run(|repos| -> ApiResult<Option<(Coil, Vec<OrderLine>)>> {
            require_line(repos, &key)?;

            let Some(mut coil) = repos.coils.find_by_allocated_line(&key)? else {
                return Ok(None);
            };
            let removed: Vec<OrderLine> = coil.deallocate_by_key(&key).into_iter().collect();
            repos.coils.save(&coil)?;
            Ok(Some((coil, removed)))
        })?;

        let Some((coil, removed)) = released else {
            return Ok(None);
        };

        self.event_publisher
            .publish(AllocationEvent::lines_deallocated(&coil.reference, &removed));
        info!(line = %key, reference = %coil.reference, "订单行已取消分配");
        Ok(Some(coil))
    }

    /// 查询订单行所在线盘
    ///
    /// # 返回
    /// - Ok(None): 订单行未分配
    /// - Err(NotFound): 订单行不存在
    pub fn get_allocation_coil(&self, order_id: &str, line_item: &str) -> ApiResult<Option<Coil>> {
        self.validator.validate_line_key(order_id, line_item)?;

        let key = OrderLineKey::new(order_id, line_item);
        self.uow.run(|repos| -> ApiResult<Option<Coil>> {
            require_line(repos, &key)?;
            Ok(repos.coils.find_by_allocated_line(&key)?)
        })
    }
}

fn require_line(repos: &AllocationRepositories<'_>, key: &OrderLineKey) -> ApiResult<()> {
    if repos.lines.find_by_key(key)?.is_none() {
        return Err(ApiError::NotFound(format!("OrderLine(id={})不存在", key)));
    }
    Ok(())
}
