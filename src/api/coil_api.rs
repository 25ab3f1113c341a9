// ==========================================
// 线盘分配系统 - 线盘 API
// ==========================================
// 职责: 线盘的增删改查; 参数变更时重新计算保留的订单行
// 说明: 被取消分配的订单行通过 LineDeallocated 事件通知外部
// ==========================================

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::InputValidator;
use crate::domain::{Coil, OrderLine};
use crate::engine::events::{AllocationEvent, AllocationEventType, OptionalEventPublisher};
use crate::engine::reallocation::plan_coil_update;
use crate::repository::{RepositoryError, UnitOfWork};

/// 线盘变更结果
#[derive(Debug, Clone)]
pub struct CoilUpdateResult {
    /// 变更后的线盘（含保留的分配）
    pub coil: Coil,
    /// 因变更而失去线盘的订单行
    pub deallocated: Vec<OrderLine>,
}

// ==========================================
// CoilApi - 线盘 API
// ==========================================
pub struct CoilApi {
    uow: UnitOfWork,
    validator: Arc<InputValidator>,
    event_publisher: OptionalEventPublisher,
}

impl CoilApi {
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

    /// 新增线盘
    ///
    /// # 返回
    /// - Err(ValidationError): 参数不合法
    /// - Err(AlreadyExists): reference 已存在
    pub fn add_coil(
        &self,
        reference: &str,
        product_id: &str,
        quantity: i64,
        recommended_balance: i64,
        acceptable_loss: i64,
    ) -> ApiResult<Coil> {
        self.validator.validate_coil(
            reference,
            product_id,
            quantity,
            recommended_balance,
            acceptable_loss,
        )?;

        let coil = Coil::new(
            reference,
            product_id,
            quantity,
            recommended_balance,
            acceptable_loss,
        );
        self.uow.run(|repos| repos.coils.insert(&coil))?;

        info!(
            reference = reference,
            product_id = product_id,
            quantity = quantity,
            "线盘已新增"
        );
        Ok(coil)
    }

    /// 查询线盘
    pub fn get_coil(&self, reference: &str) -> ApiResult<Coil> {
        self.validator.validate_coil_reference(reference)?;

        self.uow
            .run(|repos| repos.coils.find_by_reference(reference))?
            .ok_or_else(|| ApiError::NotFound(format!("Coil(id={})不存在", reference)))
    }

    /// 查询全部线盘
    pub fn list_coils(&self) -> ApiResult<Vec<Coil>> {
        let coils = self.uow.run(|repos| repos.coils.list_all())?;
        debug!(count = coils.len(), "查询线盘列表");
        Ok(coils)
    }

    /// 变更线盘参数
    ///
    /// 按新参数重新分配当前订单行（小数量优先）, 无法保留的订单行被取消分配。
    ///
    /// # 返回
    /// - Ok(CoilUpdateResult): 变更后的线盘与被取消分配的订单行
    /// - Err(NotFound): 线盘不存在
    pub fn update_coil(
        &self,
        reference: &str,
        product_id: &str,
        quantity: i64,
        recommended_balance: i64,
        acceptable_loss: i64,
    ) -> ApiResult<CoilUpdateResult> {
        self.validator.validate_coil(
            reference,
            product_id,
            quantity,
            recommended_balance,
            acceptable_loss,
        )?;

        let plan = self.uow.run(|repos| -> ApiResult<_> {
            let current = repos
                .coils
                .find_by_reference(reference)?
                .ok_or_else(|| RepositoryError::not_found("Coil", reference))?;

            let candidate = Coil::new(
                reference,
                product_id,
                quantity,
                recommended_balance,
                acceptable_loss,
            );
            let plan = plan_coil_update(&current, candidate);
            repos.coils.save(&plan.coil)?;
            Ok(plan)
        })?;

        self.event_publisher
            .publish(AllocationEvent::coil(AllocationEventType::CoilUpdated, reference));

        if plan.has_deallocations() {
            warn!(
                reference = reference,
                deallocated = plan.deallocated.len(),
                "线盘变更导致订单行失去分配"
            );
            self.event_publisher
                .publish(AllocationEvent::lines_deallocated(reference, &plan.deallocated));
        }

        info!(
            reference = reference,
            available = plan.coil.available_quantity(),
            "线盘已更新"
        );

        Ok(CoilUpdateResult {
            coil: plan.coil,
            deallocated: plan.deallocated,
        })
    }

    /// 删除线盘
    ///
    /// # 返回
    /// - Ok(Vec<OrderLine>): 删除前该线盘持有的订单行（现已未分配）
    /// - Err(NotFound): 线盘不存在
    pub fn delete_coil(&self, reference: &str) -> ApiResult<Vec<OrderLine>> {
        self.validator.validate_coil_reference(reference)?;

        let deleted = self
            .uow
            .run(|repos| repos.coils.delete(reference))?
            .ok_or_else(|| ApiError::NotFound(format!("Coil(id={})不存在", reference)))?;
        let deallocated = deleted.into_allocations();

        self.event_publisher
            .publish(AllocationEvent::coil(AllocationEventType::CoilDeleted, reference));
        if !deallocated.is_empty() {
            self.event_publisher
                .publish(AllocationEvent::lines_deallocated(reference, &deallocated));
        }

        info!(
            reference = reference,
            deallocated = deallocated.len(),
            "线盘已删除"
        );
        Ok(deallocated)
    }
}
