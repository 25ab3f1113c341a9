// ==========================================
// 线盘分配系统 - 引擎层事件发布
// ==========================================
// 职责: 定义分配事件发布 trait, 实现依赖倒置
// 说明: 订单行失去线盘时必须通知外部, 以便在别处重新分配
// ==========================================

use crate::domain::{OrderLine, OrderLineKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 分配事件类型
// ==========================================

/// 分配事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationEventType {
    /// 订单行已分配到线盘
    LineAllocated,
    /// 订单行失去线盘（需要重新分配）
    LineDeallocated,
    /// 线盘参数变更
    CoilUpdated,
    /// 线盘删除
    CoilDeleted,
    /// 订单行变更
    LineUpdated,
    /// 订单行删除
    LineDeleted,
}

impl AllocationEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            AllocationEventType::LineAllocated => "LineAllocated",
            AllocationEventType::LineDeallocated => "LineDeallocated",
            AllocationEventType::CoilUpdated => "CoilUpdated",
            AllocationEventType::CoilDeleted => "CoilDeleted",
            AllocationEventType::LineUpdated => "LineUpdated",
            AllocationEventType::LineDeleted => "LineDeleted",
        }
    }
}

/// 分配事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEvent {
    /// 事件 ID
    pub event_id: Uuid,
    /// 事件类型
    pub event_type: AllocationEventType,
    /// 相关线盘（订单行事件且未分配时为 None）
    pub coil_reference: Option<String>,
    /// 受影响的订单行
    pub lines: Vec<OrderLineKey>,
    /// 发生时间
    pub occurred_at: DateTime<Utc>,
}

impl AllocationEvent {
    /// 创建事件
    pub fn new(
        event_type: AllocationEventType,
        coil_reference: Option<String>,
        lines: Vec<OrderLineKey>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            coil_reference,
            lines,
            occurred_at: Utc::now(),
        }
    }

    /// 订单行已分配
    pub fn line_allocated(coil_reference: &str, line: &OrderLine) -> Self {
        Self::new(
            AllocationEventType::LineAllocated,
            Some(coil_reference.to_string()),
            vec![line.key()],
        )
    }

    /// 订单行失去线盘
    pub fn lines_deallocated(coil_reference: &str, lines: &[OrderLine]) -> Self {
        Self::new(
            AllocationEventType::LineDeallocated,
            Some(coil_reference.to_string()),
            lines.iter().map(OrderLine::key).collect(),
        )
    }

    /// 线盘事件（变更/删除）
    pub fn coil(event_type: AllocationEventType, coil_reference: &str) -> Self {
        Self::new(event_type, Some(coil_reference.to_string()), Vec::new())
    }

    /// 订单行事件（变更/删除）
    pub fn line(
        event_type: AllocationEventType,
        key: OrderLineKey,
        coil_reference: Option<String>,
    ) -> Self {
        Self::new(event_type, coil_reference, vec![key])
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 分配事件发布者 Trait
///
/// 由外部集成层实现（消息队列、通知服务等）
pub trait AllocationEventPublisher: Send + Sync {
    /// 发布分配事件
    ///
    /// # 返回
    /// - `Ok(id)`: 外部系统返回的标识（可为空字符串）
    /// - `Err`: 发布失败
    fn publish(&self, event: AllocationEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl AllocationEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: AllocationEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - event_type={}, coil={:?}",
            event.event_type.as_str(),
            event.coil_reference
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 发布失败只记录告警, 不影响业务操作
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn AllocationEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn AllocationEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: AllocationEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - event_type={}",
                event.event_type.as_str()
            );
            return;
        };

        let event_type = event.event_type;
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(event_type = event_type.as_str(), "分配事件发布失败: {}", e);
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}
