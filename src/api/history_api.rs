// ==========================================
// 物料库存对账系统 - 导入历史API
// ==========================================
// 职责: 历史分页、台账明细、删除（最近一次导入时同时撤销）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::history::{ImportHistorySummary, MaterialChangeDetail};
use crate::domain::query::Page;
use crate::engine::events::{CatalogEvent, OptionalEventPublisher};
use crate::engine::history_manager::HistoryManager;
use crate::repository::catalog_store::CatalogStore;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const EVENT_SOURCE: &str = "history_api";

pub const MSG_DELETED_WITH_UNDO: &str = "Đã xóa lịch sử và hoàn tác dữ liệu vật tư thành công";
pub const MSG_DELETED_ONLY: &str = "Đã xóa lịch sử (dữ liệu vật tư hiện tại không thay đổi)";

/// 删除结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteHistoryResponse {
    pub history_id: String,
    /// 是否修改了物料数据
    pub undo_applied: bool,
    pub reverted: usize,
    pub deleted_changes: usize,
    pub message: String,
}

pub struct HistoryApi<S: CatalogStore> {
    manager: HistoryManager<S>,
    publisher: OptionalEventPublisher,
}

impl<S: CatalogStore> HistoryApi<S> {
    pub fn new(store: Arc<S>, publisher: OptionalEventPublisher) -> Self {
        Self {
            manager: HistoryManager::new(store),
            publisher,
        }
    }

    pub fn list_histories(
        &self,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<ImportHistorySummary>> {
        Ok(self.manager.list(page, limit)?)
    }

    /// 某次导入的台账明细（按物料编码排序）
    pub fn get_changes(&self, history_id: &str) -> ApiResult<Vec<MaterialChangeDetail>> {
        self.manager.changes(history_id).map_err(|e| match e {
            RepositoryError::NotFound { .. } => ApiError::HistoryNotFound(history_id.to_string()),
            other => other.into(),
        })
    }

    /// 删除导入历史
    ///
    /// # 返回
    /// - Ok: undo_applied 表示是否修改了物料数据
    /// - Err(HistoryNotFound): 历史不存在
    /// - Err(UndoError): 逆操作失败，整个删除已回滚
    pub fn delete_history(&self, history_id: &str) -> ApiResult<DeleteHistoryResponse> {
        if history_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("历史ID不能为空".to_string()));
        }

        let outcome = self
            .manager
            .delete(history_id)
            .map_err(|e| ApiError::undo_failure(history_id, e))?;

        self.publisher.publish(CatalogEvent::import_deleted(
            history_id,
            outcome.undo_applied,
            Some(EVENT_SOURCE.to_string()),
        ));

        let message = if outcome.undo_applied {
            MSG_DELETED_WITH_UNDO
        } else {
            MSG_DELETED_ONLY
        };

        Ok(DeleteHistoryResponse {
            history_id: outcome.history.id,
            undo_applied: outcome.undo_applied,
            reverted: outcome.reverted,
            deleted_changes: outcome.deleted_changes,
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::{BroadcastEventPublisher, CatalogEventType};
    use crate::engine::{detect_changes, ImportCommitter};
    use crate::domain::material::MaterialRow;
    use crate::repository::memory_catalog::InMemoryCatalogStore;

    fn row(code: &str, quantity: f64) -> MaterialRow {
        MaterialRow {
            row_number: 2,
            sequence: None,
            code: code.to_string(),
            name: None,
            unit: None,
            lot: None,
            origin: None,
            quality: None,
            quantity,
            unit_price: None,
            total_value: None,
        }
    }

    fn import(store: &Arc<InMemoryCatalogStore>, rows: &[MaterialRow]) -> String {
        let set = detect_changes(rows, &store.list_active_materials().unwrap());
        ImportCommitter::new(Arc::clone(store))
            .commit("f.xlsx", rows, &set)
            .unwrap()
            .history
            .id
    }

    #[test]
    fn test_delete_head_reports_undo_and_publishes() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let broadcast = Arc::new(BroadcastEventPublisher::new(8));
        let mut events = broadcast.subscribe();
        let api = HistoryApi::new(
            Arc::clone(&store),
            OptionalEventPublisher::with_publisher(broadcast),
        );

        let id = import(&store, &[row("A", 4.0)]);
        let response = api.delete_history(&id).unwrap();

        assert!(response.undo_applied);
        assert_eq!(response.message, MSG_DELETED_WITH_UNDO);

        let event = events.try_recv().unwrap();
        assert_eq!(event.event_type, CatalogEventType::ImportDeleted);
        assert!(event.undo_applied);
    }

    #[test]
    fn test_delete_superseded_reports_plain_deletion() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let api = HistoryApi::new(Arc::clone(&store), OptionalEventPublisher::none());

        let first = import(&store, &[row("A", 4.0)]);
        import(&store, &[row("A", 6.0)]);

        let response = api.delete_history(&first).unwrap();
        assert!(!response.undo_applied);
        assert_eq!(response.message, MSG_DELETED_ONLY);
    }

    #[test]
    fn test_missing_history_is_distinct_error() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let api = HistoryApi::new(store, OptionalEventPublisher::none());

        assert_eq!(api.delete_history("nope").unwrap_err().code(), "HISTORY_NOT_FOUND");
        assert_eq!(api.get_changes("nope").unwrap_err().code(), "HISTORY_NOT_FOUND");
        assert_eq!(api.delete_history(" ").unwrap_err().code(), "INVALID_INPUT");
    }
}
