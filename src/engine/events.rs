// ==========================================
// 物料库存对账系统 - 目录事件发布
// ==========================================
// 职责: 提交/删除成功后通知外部（视图刷新、缓存失效）
// 说明: 引擎层只定义 trait，展示层自行订阅
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 广播通道默认容量
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

// ==========================================
// 目录事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEventType {
    /// 导入已提交
    ImportCommitted,
    /// 导入历史已删除（可能伴随撤销）
    ImportDeleted,
}

impl CatalogEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogEventType::ImportCommitted => "ImportCommitted",
            CatalogEventType::ImportDeleted => "ImportDeleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEvent {
    pub history_id: String,
    pub event_type: CatalogEventType,
    /// 删除事件: 是否修改了物料数据
    pub undo_applied: bool,
    pub source: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl CatalogEvent {
    pub fn import_committed(history_id: &str, source: Option<String>) -> Self {
        Self {
            history_id: history_id.to_string(),
            event_type: CatalogEventType::ImportCommitted,
            undo_applied: false,
            source,
            occurred_at: Utc::now(),
        }
    }

    pub fn import_deleted(history_id: &str, undo_applied: bool, source: Option<String>) -> Self {
        Self {
            history_id: history_id.to_string(),
            event_type: CatalogEventType::ImportDeleted,
            undo_applied,
            source,
            occurred_at: Utc::now(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 目录事件发布者
///
/// 发布发生在事务提交之后；发布失败只记录日志，不影响已提交的数据
pub trait CatalogEventPublisher: Send + Sync {
    fn publish(&self, event: CatalogEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl CatalogEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: CatalogEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            history_id = %event.history_id,
            event_type = event.event_type.as_str(),
            "NoOpEventPublisher: 跳过事件发布"
        );
        Ok(())
    }
}

/// 基于 tokio broadcast 的发布者
///
/// 没有订阅者时视为成功
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<CatalogEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl CatalogEventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: CatalogEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(receivers, "目录事件已广播");
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn CatalogEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn CatalogEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn CatalogEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    /// 发布事件；失败只记录警告
    pub fn publish(&self, event: CatalogEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                history_id = %event.history_id,
                event_type = event.event_type.as_str(),
                "未配置发布者，跳过事件"
            );
            return;
        };

        let history_id = event.history_id.clone();
        let event_type = event.event_type;
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(
                history_id = %history_id,
                event_type = event_type.as_str(),
                error = %e,
                "目录事件发布失败"
            );
        }
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
