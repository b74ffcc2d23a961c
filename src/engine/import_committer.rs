// ==========================================
// 物料库存对账系统 - 导入提交器
// ==========================================
// 职责: 在单个事务中应用 ChangeSet，写入 ImportHistory 与台账
// 流程:
// 1. 事务内重新检测差异，与调用方的 ChangeSet 不一致则中止
// 2. 写入 ImportHistory（计数来自 ChangeSet）
// 3. 按快照顺序逐行应用:
//    NEW: 按编码 upsert（停用物料重新启用）
//    INCREASE/DECREASE: 刷新描述字段 + 数量
//    其余行只刷新描述字段，不写台账
// 4. REMOVED: active = false, quantity = 0
// 红线: 任一步失败整体回滚
// ==========================================

use crate::domain::change_set::{ChangeItem, ChangeSet};
use crate::domain::history::{ImportHistory, MaterialChange};
use crate::domain::material::{Material, MaterialDetails, MaterialRow};
use crate::domain::types::ChangeType;
use crate::engine::change_detector::detect_changes;
use crate::repository::catalog_store::{CatalogStore, CatalogTx};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// 提交结果
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub history: ImportHistory,
    /// 写入的台账条目数
    pub ledger_entries: usize,
    /// 只刷新描述字段的物料数
    pub refreshed: usize,
}

pub struct ImportCommitter<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> ImportCommitter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 提交一次导入
    ///
    /// # 返回
    /// - Ok(CommitReport): 事务已提交
    /// - Err(StaleChangeSet): 目录在预览后发生变化
    /// - Err(其他): 事务已回滚，目录与台账保持原状
    #[tracing::instrument(skip(self, rows, change_set), fields(rows = rows.len()))]
    pub fn commit(
        &self,
        file_name: &str,
        rows: &[MaterialRow],
        change_set: &ChangeSet,
    ) -> RepositoryResult<CommitReport> {
        // 时间戳在持有写锁后取得，历史顺序与提交顺序一致
        let result = self
            .store
            .transaction(|tx| apply_change_set(tx, file_name, rows, change_set, Utc::now()));

        match &result {
            Ok(report) => tracing::info!(
                history_id = %report.history.id,
                total_rows = report.history.total_items,
                new = report.history.new_items,
                updated = report.history.updated_items,
                removed = report.history.removed_items,
                refreshed = report.refreshed,
                "导入已提交"
            ),
            Err(e) => tracing::error!(error = %e, "导入提交失败，事务已回滚"),
        }
        result
    }
}

fn apply_change_set(
    tx: &mut dyn CatalogTx,
    file_name: &str,
    rows: &[MaterialRow],
    change_set: &ChangeSet,
    now: DateTime<Utc>,
) -> RepositoryResult<CommitReport> {
    ensure_fresh(tx, rows, change_set)?;

    let history = ImportHistory {
        id: Uuid::new_v4().to_string(),
        file_name: file_name.to_string(),
        imported_at: now,
        total_items: change_set.total_in_file as i64,
        new_items: change_set.new_items.len() as i64,
        updated_items: change_set.updated_count() as i64,
        removed_items: change_set.removed_items.len() as i64,
    };
    tx.insert_history(&history)?;

    let by_row = entries_by_row(rows, change_set)?;
    let mut ledger_entries = 0;
    let mut refreshed = 0;
    // 本次提交中已写入台账的编码（重复编码按快照顺序，后出现者生效）
    let mut touched: HashSet<&str> = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        let Some(item) = by_row.get(&index) else {
            if touched.contains(row.code.as_str()) {
                apply_snapshot_row(tx, row, now)?;
            } else {
                refreshed +=
                    tx.update_material_details(&row.code, &MaterialDetails::from_row(row), now)?;
            }
            continue;
        };

        let material = match item.change_type {
            ChangeType::New => tx.upsert_material(row, now)?,
            _ => apply_snapshot_row(tx, row, now)?,
        };
        tx.insert_change(&ledger_entry(&history.id, &material.id, item, now))?;
        ledger_entries += 1;
        touched.insert(row.code.as_str());
    }

    for item in &change_set.removed_items {
        let mut material = tx
            .find_material_by_code(&item.code)?
            .ok_or_else(|| RepositoryError::not_found("Material", &item.code))?;
        material.active = false;
        material.quantity = 0.0;
        material.updated_at = now;
        tx.update_material(&material)?;
        tx.insert_change(&ledger_entry(&history.id, &material.id, item, now))?;
        ledger_entries += 1;
    }

    Ok(CommitReport {
        history,
        ledger_entries,
        refreshed,
    })
}

/// 事务内重新检测，确认预览结果仍然成立
fn ensure_fresh(
    tx: &mut dyn CatalogTx,
    rows: &[MaterialRow],
    change_set: &ChangeSet,
) -> RepositoryResult<()> {
    if change_set.total_in_file != rows.len() {
        return Err(RepositoryError::StaleChangeSet {
            code: String::new(),
            message: format!(
                "差异集合对应 {} 行，实际提交 {} 行",
                change_set.total_in_file,
                rows.len()
            ),
        });
    }

    let current = detect_changes(rows, &tx.list_active_materials()?);
    if current.same_classification(change_set) {
        return Ok(());
    }

    let expected: Vec<&ChangeItem> = current.iter().collect();
    let supplied: Vec<&ChangeItem> = change_set.iter().collect();
    let code = expected
        .iter()
        .zip(supplied.iter())
        .find(|(a, b)| {
            a.code != b.code
                || a.change_type != b.change_type
                || a.old_quantity != b.old_quantity
                || a.new_quantity != b.new_quantity
        })
        .map(|(a, _)| a.code.clone())
        .or_else(|| {
            let shorter = expected.len().min(supplied.len());
            expected
                .get(shorter)
                .or_else(|| supplied.get(shorter))
                .map(|i| i.code.clone())
        })
        .unwrap_or_default();

    tracing::warn!(code = %code, "目录已变化，差异集合过期");
    Err(RepositoryError::StaleChangeSet {
        code,
        message: "目录在预览之后已被修改，请重新预览".to_string(),
    })
}

/// 按快照行号索引 NEW / INCREASE / DECREASE 条目
fn entries_by_row<'a>(
    rows: &[MaterialRow],
    change_set: &'a ChangeSet,
) -> RepositoryResult<HashMap<usize, &'a ChangeItem>> {
    let mut by_row = HashMap::new();
    for item in change_set
        .new_items
        .iter()
        .chain(change_set.increased_items.iter())
        .chain(change_set.decreased_items.iter())
    {
        let index = item
            .row_index
            .filter(|&index| rows.get(index).is_some_and(|row| row.code == item.code))
            .ok_or_else(|| {
                RepositoryError::InternalError(format!("差异条目 {} 缺少对应的快照行", item.code))
            })?;
        by_row.insert(index, item);
    }
    Ok(by_row)
}

/// 以快照行覆盖已有物料的描述字段与数量
fn apply_snapshot_row(
    tx: &mut dyn CatalogTx,
    row: &MaterialRow,
    now: DateTime<Utc>,
) -> RepositoryResult<Material> {
    let mut material = tx
        .find_material_by_code(&row.code)?
        .ok_or_else(|| RepositoryError::not_found("Material", &row.code))?;
    material.apply_details(&MaterialDetails::from_row(row));
    material.quantity = row.quantity;
    material.updated_at = now;
    tx.update_material(&material)?;
    Ok(material)
}

fn ledger_entry(
    import_id: &str,
    material_id: &str,
    item: &ChangeItem,
    now: DateTime<Utc>,
) -> MaterialChange {
    MaterialChange {
        id: Uuid::new_v4().to_string(),
        import_id: import_id.to_string(),
        material_id: material_id.to_string(),
        change_type: item.change_type,
        old_quantity: item.old_quantity,
        new_quantity: item.new_quantity,
        quantity_diff: Some(item.quantity_diff),
        note: Some(item.note.clone()),
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_catalog::InMemoryCatalogStore;

    fn row(code: &str, name: &str, quantity: f64) -> MaterialRow {
        MaterialRow {
            row_number: 1,
            sequence: None,
            code: code.to_string(),
            name: Some(name.to_string()),
            unit: None,
            lot: None,
            origin: None,
            quality: None,
            quantity,
            unit_price: None,
            total_value: None,
        }
    }

    fn commit_rows(
        committer: &ImportCommitter<InMemoryCatalogStore>,
        store: &InMemoryCatalogStore,
        rows: &[MaterialRow],
    ) -> CommitReport {
        let set = detect_changes(rows, &store.list_active_materials().unwrap());
        committer.commit("snapshot.xlsx", rows, &set).unwrap()
    }

    #[test]
    fn test_commit_applies_all_buckets() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let committer = ImportCommitter::new(Arc::clone(&store));

        commit_rows(&committer, &store, &[row("A", "a", 10.0), row("R", "r", 4.0)]);
        let report = commit_rows(&committer, &store, &[row("A", "a2", 15.0), row("B", "b", 5.0)]);

        assert_eq!(report.ledger_entries, 3);
        assert_eq!(report.history.new_items, 1);
        assert_eq!(report.history.updated_items, 1);
        assert_eq!(report.history.removed_items, 1);
        assert_eq!(report.history.total_items, 2);

        let a = store.find_material_by_code("A").unwrap().unwrap();
        assert_eq!(a.quantity, 15.0);
        assert_eq!(a.name.as_deref(), Some("a2"));

        let r = store.find_material_by_code("R").unwrap().unwrap();
        assert!(!r.active);
        assert_eq!(r.quantity, 0.0);

        let changes = store.list_change_details(&report.history.id).unwrap();
        let kinds: Vec<_> = changes.iter().map(|c| (c.material_code.as_str(), c.change.change_type)).collect();
        assert_eq!(
            kinds,
            vec![("A", ChangeType::Increase), ("B", ChangeType::New), ("R", ChangeType::Removed)]
        );
    }

    #[test]
    fn test_unchanged_rows_only_refresh_details() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let committer = ImportCommitter::new(Arc::clone(&store));

        commit_rows(&committer, &store, &[row("A", "old", 3.0)]);
        let report = commit_rows(&committer, &store, &[row("A", "new", 3.0)]);

        assert_eq!(report.ledger_entries, 0);
        assert_eq!(report.refreshed, 1);
        assert!(store.list_change_details(&report.history.id).unwrap().is_empty());
        let a = store.find_material_by_code("A").unwrap().unwrap();
        assert_eq!(a.name.as_deref(), Some("new"));
        assert_eq!(a.quantity, 3.0);
    }

    #[test]
    fn test_duplicate_codes_apply_in_snapshot_order() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let committer = ImportCommitter::new(Arc::clone(&store));
        commit_rows(&committer, &store, &[row("A", "a", 10.0)]);

        // DECREASE 在前，INCREASE 在后
        let report = commit_rows(&committer, &store, &[row("A", "a", 8.0), row("A", "a", 12.0)]);
        assert_eq!(report.ledger_entries, 2);
        assert_eq!(store.find_material_by_code("A").unwrap().unwrap().quantity, 12.0);

        // 最后一次出现与目录相同: 数量回到该行
        let report = commit_rows(&committer, &store, &[row("A", "a", 20.0), row("A", "a2", 12.0)]);
        assert_eq!(report.ledger_entries, 1);
        let a = store.find_material_by_code("A").unwrap().unwrap();
        assert_eq!(a.quantity, 12.0);
        assert_eq!(a.name.as_deref(), Some("a2"));
    }

    #[test]
    fn test_stale_change_set_is_rejected() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let committer = ImportCommitter::new(Arc::clone(&store));

        let rows = vec![row("A", "a", 1.0)];
        let preview = detect_changes(&rows, &store.list_active_materials().unwrap());

        // 预览之后另一次导入先提交
        commit_rows(&committer, &store, &[row("A", "a", 5.0)]);

        let err = committer.commit("late.xlsx", &rows, &preview).unwrap_err();
        match err {
            RepositoryError::StaleChangeSet { code, .. } => assert_eq!(code, "A"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.list_histories(1, 0).unwrap().total, 1);
    }

    #[test]
    fn test_row_count_mismatch_is_rejected() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let committer = ImportCommitter::new(Arc::clone(&store));

        let rows = vec![row("A", "a", 1.0)];
        let set = detect_changes(&rows, &[]);
        let result = committer.commit("x.xlsx", &[], &set);
        assert!(matches!(result, Err(RepositoryError::StaleChangeSet { .. })));
    }
}
