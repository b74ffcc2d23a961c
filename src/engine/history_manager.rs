// ==========================================
// 物料库存对账系统 - 导入历史管理 / 撤销
// ==========================================
// 状态: committed-and-head → committed-and-superseded → deleted
// 删除规则:
// - 目标是最近一次导入且有台账条目: 逆序回放逆操作（只改 quantity / active）
//   NEW      → active = false, quantity = 0
//   REMOVED  → active = true,  quantity = old
//   INC/DEC  → quantity = old
// - 无论是否撤销，都删除台账条目与历史记录
// 红线: 逆操作任一条失败，整个删除回滚
// ==========================================

use crate::domain::history::{ImportHistory, ImportHistorySummary, MaterialChange, MaterialChangeDetail};
use crate::domain::query::Page;
use crate::domain::types::ChangeType;
use crate::repository::catalog_store::{CatalogStore, CatalogTx};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 删除结果
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub history: ImportHistory,
    /// 删除时是否为最近一次导入
    pub was_head: bool,
    /// 是否修改了物料数据
    pub undo_applied: bool,
    /// 已回放的逆操作条数
    pub reverted: usize,
    pub deleted_changes: usize,
}

pub struct HistoryManager<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> HistoryManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 导入历史（最新在前）
    pub fn list(&self, page: u32, limit: u32) -> RepositoryResult<Page<ImportHistorySummary>> {
        self.store.list_histories(page, limit)
    }

    /// 某次导入的台账明细（按物料编码排序）
    pub fn changes(&self, history_id: &str) -> RepositoryResult<Vec<MaterialChangeDetail>> {
        if self.store.find_history(history_id)?.is_none() {
            return Err(RepositoryError::not_found("ImportHistory", history_id));
        }
        self.store.list_change_details(history_id)
    }

    /// 删除导入历史；若为最近一次导入则先撤销其台账
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, history_id: &str) -> RepositoryResult<DeleteOutcome> {
        let result = self
            .store
            .transaction(|tx| delete_in_tx(tx, history_id, Utc::now()));

        match &result {
            Ok(outcome) => tracing::info!(
                history_id,
                was_head = outcome.was_head,
                undo_applied = outcome.undo_applied,
                reverted = outcome.reverted,
                "导入历史已删除"
            ),
            Err(RepositoryError::NotFound { .. }) => {
                tracing::warn!(history_id, "导入历史不存在")
            }
            Err(e) => tracing::error!(history_id, error = %e, "删除导入历史失败，事务已回滚"),
        }
        result
    }
}

fn delete_in_tx(
    tx: &mut dyn CatalogTx,
    history_id: &str,
    now: DateTime<Utc>,
) -> RepositoryResult<DeleteOutcome> {
    let history = tx
        .find_history(history_id)?
        .ok_or_else(|| RepositoryError::not_found("ImportHistory", history_id))?;

    let was_head = tx
        .latest_history()?
        .map(|head| head.id == history.id)
        .unwrap_or(false);

    let mut reverted = 0;
    if was_head {
        let changes = tx.list_changes_for_history(history_id)?;
        for change in changes.iter().rev() {
            if revert_change(tx, change, now)? {
                reverted += 1;
            }
        }
    }

    let deleted_changes = tx.delete_changes_for_history(history_id)?;
    tx.delete_history(history_id)?;

    Ok(DeleteOutcome {
        history,
        was_head,
        undo_applied: reverted > 0,
        reverted,
        deleted_changes,
    })
}

/// 回放单条台账的逆操作，返回是否修改了物料
fn revert_change(
    tx: &mut dyn CatalogTx,
    change: &MaterialChange,
    now: DateTime<Utc>,
) -> RepositoryResult<bool> {
    let mut material = tx.get_material_by_id(&change.material_id)?;

    let previous_quantity = || {
        change.old_quantity.ok_or_else(|| {
            RepositoryError::InternalError(format!(
                "台账条目 {} ({}) 缺少 old_quantity，无法撤销",
                change.id, change.change_type
            ))
        })
    };

    match change.change_type {
        ChangeType::New => {
            material.active = false;
            material.quantity = 0.0;
        }
        ChangeType::Removed => {
            material.active = true;
            material.quantity = previous_quantity()?;
        }
        ChangeType::Increase | ChangeType::Decrease => {
            material.quantity = previous_quantity()?;
        }
        ChangeType::InfoUpdate => return Ok(false),
    }

    material.updated_at = now;
    tx.update_material(&material)?;
    tracing::debug!(
        code = %material.code,
        change_type = %change.change_type,
        quantity = material.quantity,
        active = material.active,
        "已回放逆操作"
    );
    Ok(true)
}
