// ==========================================
// 物料库存对账系统 - 内存目录仓储
// ==========================================
// 用途: 单元测试用的内存仓储（仅测试构建）
// 事务: 在状态副本上执行闭包，成功后整体替换（写事务在互斥锁内串行）
// 约束: 与 SQLite 表约束一致（编码唯一、数量非负、台账外键、级联删除）
// ==========================================

use crate::domain::history::{ImportHistory, ImportHistorySummary, MaterialChange, MaterialChangeDetail};
use crate::domain::material::{Material, MaterialDetails};
use crate::domain::query::{page_offset, DashboardStats, MaterialQuery, Page};
use crate::domain::types::{MaterialSortField, SortOrder};
use crate::repository::catalog_store::{CatalogStore, CatalogTx};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    materials: Vec<Material>,
    histories: Vec<ImportHistory>,
    changes: Vec<MaterialChange>,
}

impl CatalogState {
    fn material_index_by_id(&self, id: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.id == id)
    }

    fn latest_history(&self) -> Option<&ImportHistory> {
        self.histories
            .iter()
            .enumerate()
            .max_by_key(|(index, h)| (h.imported_at, *index))
            .map(|(_, h)| h)
    }
}

fn check_quantity(material: &Material) -> RepositoryResult<()> {
    if material.quantity < 0.0 || material.quantity.is_nan() {
        return Err(RepositoryError::DatabaseQueryError(format!(
            "CHECK constraint failed: quantity >= 0 (code={})",
            material.code
        )));
    }
    Ok(())
}

// ==========================================
// InMemoryCatalogStore
// ==========================================
#[derive(Default)]
pub struct InMemoryCatalogStore {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_state(&self) -> RepositoryResult<MutexGuard<'_, CatalogState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

struct MemoryCatalogTx<'a> {
    state: &'a mut CatalogState,
}

impl CatalogTx for MemoryCatalogTx<'_> {
    fn find_material_by_code(&self, code: &str) -> RepositoryResult<Option<Material>> {
        Ok(self.state.materials.iter().find(|m| m.code == code).cloned())
    }

    fn find_material_by_id(&self, id: &str) -> RepositoryResult<Option<Material>> {
        Ok(self.state.materials.iter().find(|m| m.id == id).cloned())
    }

    fn list_active_materials(&self) -> RepositoryResult<Vec<Material>> {
        Ok(self
            .state
            .materials
            .iter()
            .filter(|m| m.active)
            .cloned()
            .collect())
    }

    fn insert_material(&mut self, material: &Material) -> RepositoryResult<()> {
        if self.state.materials.iter().any(|m| m.code == material.code) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "UNIQUE constraint failed: material.code ({})",
                material.code
            )));
        }
        check_quantity(material)?;
        self.state.materials.push(material.clone());
        Ok(())
    }

    fn update_material(&mut self, material: &Material) -> RepositoryResult<()> {
        check_quantity(material)?;
        if self
            .state
            .materials
            .iter()
            .any(|m| m.code == material.code && m.id != material.id)
        {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "UNIQUE constraint failed: material.code ({})",
                material.code
            )));
        }

        let index = self
            .state
            .material_index_by_id(&material.id)
            .ok_or_else(|| RepositoryError::not_found("Material", &material.id))?;

        let created_at = self.state.materials[index].created_at;
        self.state.materials[index] = Material {
            created_at,
            ..material.clone()
        };
        Ok(())
    }

    fn update_material_details(
        &mut self,
        code: &str,
        details: &MaterialDetails,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<usize> {
        let mut count = 0;
        for material in self.state.materials.iter_mut().filter(|m| m.code == code) {
            material.apply_details(details);
            material.updated_at = updated_at;
            count += 1;
        }
        Ok(count)
    }

    fn insert_history(&mut self, history: &ImportHistory) -> RepositoryResult<()> {
        if self.state.histories.iter().any(|h| h.id == history.id) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "UNIQUE constraint failed: import_history.id ({})",
                history.id
            )));
        }
        self.state.histories.push(history.clone());
        Ok(())
    }

    fn find_history(&self, id: &str) -> RepositoryResult<Option<ImportHistory>> {
        Ok(self.state.histories.iter().find(|h| h.id == id).cloned())
    }

    fn latest_history(&self) -> RepositoryResult<Option<ImportHistory>> {
        Ok(self.state.latest_history().cloned())
    }

    fn delete_history(&mut self, id: &str) -> RepositoryResult<usize> {
        let before = self.state.histories.len();
        self.state.histories.retain(|h| h.id != id);
        // ON DELETE CASCADE
        self.state.changes.retain(|c| c.import_id != id);
        Ok(before - self.state.histories.len())
    }

    fn insert_change(&mut self, change: &MaterialChange) -> RepositoryResult<()> {
        if !self.state.histories.iter().any(|h| h.id == change.import_id)
            || self.state.material_index_by_id(&change.material_id).is_none()
        {
            return Err(RepositoryError::ForeignKeyViolation(format!(
                "FOREIGN KEY constraint failed: material_change {}",
                change.id
            )));
        }
        self.state.changes.push(change.clone());
        Ok(())
    }

    fn list_changes_for_history(&self, import_id: &str) -> RepositoryResult<Vec<MaterialChange>> {
        Ok(self
            .state
            .changes
            .iter()
            .filter(|c| c.import_id == import_id)
            .cloned()
            .collect())
    }

    fn delete_changes_for_history(&mut self, import_id: &str) -> RepositoryResult<usize> {
        let before = self.state.changes.len();
        self.state.changes.retain(|c| c.import_id != import_id);
        Ok(before - self.state.changes.len())
    }
}

// ==========================================
// 排序（与 SQLite 语义一致: NULL 在升序最前）
// ==========================================
fn sequence_key(material: &Material) -> Option<f64> {
    material
        .sequence
        .as_deref()
        .map(|s| s.trim().parse::<f64>().unwrap_or(0.0))
}

fn compare_option_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

fn compare_materials(a: &Material, b: &Material, field: MaterialSortField) -> Ordering {
    match field {
        MaterialSortField::Code => a.code.cmp(&b.code),
        MaterialSortField::Name => a.name.cmp(&b.name),
        MaterialSortField::Quantity => a.quantity.total_cmp(&b.quantity),
        MaterialSortField::Sequence => compare_option_f64(sequence_key(a), sequence_key(b)),
    }
}

fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
    if limit == 0 {
        return items;
    }
    items
        .into_iter()
        .skip(page_offset(page, limit) as usize)
        .take(limit as usize)
        .collect()
}

impl CatalogStore for InMemoryCatalogStore {
    fn transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn CatalogTx) -> RepositoryResult<T>,
    {
        let mut state = self.get_state()?;
        let mut working = state.clone();

        let value = {
            let mut scope = MemoryCatalogTx {
                state: &mut working,
            };
            f(&mut scope)?
        };

        *state = working;
        Ok(value)
    }

    fn list_active_materials(&self) -> RepositoryResult<Vec<Material>> {
        let state = self.get_state()?;
        Ok(state.materials.iter().filter(|m| m.active).cloned().collect())
    }

    fn find_material_by_code(&self, code: &str) -> RepositoryResult<Option<Material>> {
        let state = self.get_state()?;
        Ok(state.materials.iter().find(|m| m.code == code).cloned())
    }

    fn list_materials(&self, query: &MaterialQuery) -> RepositoryResult<Page<Material>> {
        let state = self.get_state()?;
        let term = query.search_term().map(str::to_lowercase);

        let mut matched: Vec<Material> = state
            .materials
            .iter()
            .filter(|m| query.include_inactive || m.active)
            .filter(|m| match &term {
                None => true,
                Some(t) => {
                    m.code.to_lowercase().contains(t.as_str())
                        || m.name
                            .as_deref()
                            .map(|n| n.to_lowercase().contains(t.as_str()))
                            .unwrap_or(false)
                }
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let primary = compare_materials(a, b, query.sort_by);
            let primary = match query.order {
                SortOrder::Asc => primary,
                SortOrder::Desc => primary.reverse(),
            };
            primary.then_with(|| a.code.cmp(&b.code))
        });

        let total = matched.len() as i64;
        let items = paginate(matched, query.page, query.limit);
        Ok(Page::new(items, total, query.page, query.limit))
    }

    fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        let state = self.get_state()?;

        let total_materials = state.materials.len() as i64;
        let active: Vec<&Material> = state.materials.iter().filter(|m| m.active).collect();
        let total_value: f64 = active
            .iter()
            .map(|m| m.quantity * m.unit_price.unwrap_or(0.0))
            .sum();

        Ok(DashboardStats {
            total_materials,
            active_materials: active.len() as i64,
            inactive_materials: total_materials - active.len() as i64,
            total_value,
            recent_import: state.latest_history().cloned(),
        })
    }

    fn list_histories(
        &self,
        page: u32,
        limit: u32,
    ) -> RepositoryResult<Page<ImportHistorySummary>> {
        let state = self.get_state()?;

        let mut ordered: Vec<(usize, &ImportHistory)> = state.histories.iter().enumerate().collect();
        ordered.sort_by(|(ia, a), (ib, b)| {
            b.imported_at
                .cmp(&a.imported_at)
                .then_with(|| ib.cmp(ia))
        });

        let summaries: Vec<ImportHistorySummary> = ordered
            .into_iter()
            .map(|(_, h)| ImportHistorySummary {
                history: h.clone(),
                change_count: state.changes.iter().filter(|c| c.import_id == h.id).count() as i64,
            })
            .collect();

        let total = summaries.len() as i64;
        Ok(Page::new(paginate(summaries, page, limit), total, page, limit))
    }

    fn find_history(&self, id: &str) -> RepositoryResult<Option<ImportHistory>> {
        let state = self.get_state()?;
        Ok(state.histories.iter().find(|h| h.id == id).cloned())
    }

    fn list_change_details(&self, import_id: &str) -> RepositoryResult<Vec<MaterialChangeDetail>> {
        let state = self.get_state()?;

        let mut details = Vec::new();
        for change in state.changes.iter().filter(|c| c.import_id == import_id) {
            let material = state
                .materials
                .iter()
                .find(|m| m.id == change.material_id)
                .ok_or_else(|| RepositoryError::not_found("Material", &change.material_id))?;
            details.push(MaterialChangeDetail {
                change: change.clone(),
                material_code: material.code.clone(),
                material_name: material.name.clone(),
                unit: material.unit.clone(),
            });
        }

        // 稳定排序，同编码保持写入顺序
        details.sort_by(|a, b| a.material_code.cmp(&b.material_code));
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::material::MaterialRow;

    fn row(code: &str, quantity: f64) -> MaterialRow {
        MaterialRow {
            row_number: 1,
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

    #[test]
    fn test_failed_transaction_leaves_state_untouched() {
        let store = InMemoryCatalogStore::new();
        let result: RepositoryResult<()> = store.transaction(|tx| {
            tx.upsert_material(&row("A", 1.0), Utc::now())?;
            Err(RepositoryError::InternalError("boom".to_string()))
        });

        assert!(result.is_err());
        assert!(store.list_active_materials().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_reactivates_existing_code() {
        let store = InMemoryCatalogStore::new();
        let now = Utc::now();

        let original = store
            .transaction(|tx| tx.upsert_material(&row("A", 3.0), now))
            .unwrap();
        store
            .transaction(|tx| {
                let mut m = tx.get_material_by_id(&original.id)?;
                m.active = false;
                m.quantity = 0.0;
                tx.update_material(&m)
            })
            .unwrap();
        assert!(store.list_active_materials().unwrap().is_empty());

        let revived = store
            .transaction(|tx| tx.upsert_material(&row("A", 7.0), now))
            .unwrap();
        assert_eq!(revived.id, original.id);
        assert!(revived.active);
        assert_eq!(revived.quantity, 7.0);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let store = InMemoryCatalogStore::new();
        let result = store.transaction(|tx| tx.upsert_material(&row("A", -1.0), Utc::now()));
        assert!(result.is_err());
    }
}
