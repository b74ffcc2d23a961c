// ==========================================
// 物料库存对账系统 - 存储端口
// ==========================================
// 职责: 定义物料目录 + 导入台账的存取接口（不包含实现）
// 红线: 引擎层只依赖本端口，不依赖具体存储
// 实现者: SqliteCatalogStore（单元测试另有 InMemoryCatalogStore）
// ==========================================

use crate::domain::history::{ImportHistory, ImportHistorySummary, MaterialChange, MaterialChangeDetail};
use crate::domain::material::{Material, MaterialDetails, MaterialRow};
use crate::domain::query::{DashboardStats, MaterialQuery, Page};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};

// ==========================================
// CatalogTx - 事务作用域内的读写操作
// ==========================================
// 闭包返回 Err 时整个事务回滚
pub trait CatalogTx {
    // ===== 物料 =====
    fn find_material_by_code(&self, code: &str) -> RepositoryResult<Option<Material>>;

    fn find_material_by_id(&self, id: &str) -> RepositoryResult<Option<Material>>;

    /// 在库物料（按写入顺序）
    fn list_active_materials(&self) -> RepositoryResult<Vec<Material>>;

    fn insert_material(&mut self, material: &Material) -> RepositoryResult<()>;

    /// 整体覆盖（按 id），记录不存在时返回 NotFound
    fn update_material(&mut self, material: &Material) -> RepositoryResult<()>;

    /// 只刷新描述字段，返回受影响行数
    fn update_material_details(
        &mut self,
        code: &str,
        details: &MaterialDetails,
        updated_at: DateTime<Utc>,
    ) -> RepositoryResult<usize>;

    /// 按编码写入快照行: 已存在（含停用）则覆盖并重新启用，否则新建
    fn upsert_material(
        &mut self,
        row: &MaterialRow,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Material> {
        match self.find_material_by_code(&row.code)? {
            Some(mut existing) => {
                existing.apply_details(&MaterialDetails::from_row(row));
                existing.quantity = row.quantity;
                existing.active = true;
                existing.updated_at = now;
                self.update_material(&existing)?;
                Ok(existing)
            }
            None => {
                let created = Material::from_row(row, now);
                self.insert_material(&created)?;
                Ok(created)
            }
        }
    }

    // ===== 导入历史 =====
    fn insert_history(&mut self, history: &ImportHistory) -> RepositoryResult<()>;

    fn find_history(&self, id: &str) -> RepositoryResult<Option<ImportHistory>>;

    /// 最近一次导入（imported_at 最新，同刻取后写入者）
    fn latest_history(&self) -> RepositoryResult<Option<ImportHistory>>;

    fn delete_history(&mut self, id: &str) -> RepositoryResult<usize>;

    // ===== 台账 =====
    fn insert_change(&mut self, change: &MaterialChange) -> RepositoryResult<()>;

    /// 某次导入的台账条目（按写入顺序）
    fn list_changes_for_history(&self, import_id: &str) -> RepositoryResult<Vec<MaterialChange>>;

    fn delete_changes_for_history(&mut self, import_id: &str) -> RepositoryResult<usize>;

    /// 读取物料，不存在时返回 NotFound
    fn get_material_by_id(&self, id: &str) -> RepositoryResult<Material> {
        self.find_material_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Material", id))
    }
}

// ==========================================
// CatalogStore - 存储入口
// ==========================================
pub trait CatalogStore: Send + Sync {
    /// 在单个原子事务中执行闭包
    ///
    /// 写事务之间串行执行；闭包返回 Err 时不留下任何修改
    fn transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn CatalogTx) -> RepositoryResult<T>;

    // ===== 只读查询 =====
    fn list_active_materials(&self) -> RepositoryResult<Vec<Material>>;

    fn find_material_by_code(&self, code: &str) -> RepositoryResult<Option<Material>>;

    fn list_materials(&self, query: &MaterialQuery) -> RepositoryResult<Page<Material>>;

    fn dashboard_stats(&self) -> RepositoryResult<DashboardStats>;

    /// 导入历史（最新在前），附带台账条目数
    fn list_histories(&self, page: u32, limit: u32) -> RepositoryResult<Page<ImportHistorySummary>>;

    fn find_history(&self, id: &str) -> RepositoryResult<Option<ImportHistory>>;

    /// 台账明细（按物料编码排序）
    fn list_change_details(&self, import_id: &str) -> RepositoryResult<Vec<MaterialChangeDetail>>;
}
