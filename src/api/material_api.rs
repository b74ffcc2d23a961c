// ==========================================
// 物料库存对账系统 - 物料 API
// ==========================================
// 职责: 物料分页查询（搜索/排序/含停用）、按编码查询
// ==========================================

use std::sync::Arc;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::material::Material;
use crate::domain::query::{MaterialQuery, Page};
use crate::repository::catalog_store::CatalogStore;

/// 单页最大条数（limit = 0 表示返回全部，不受此限制）
pub const MAX_PAGE_LIMIT: u32 = 1000;

pub struct MaterialApi<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> MaterialApi<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 物料分页列表
    pub fn list_materials(&self, query: &MaterialQuery) -> ApiResult<Page<Material>> {
        if query.limit > MAX_PAGE_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit 不能超过 {} (0 表示全部)",
                MAX_PAGE_LIMIT
            )));
        }

        let page = self.store.list_materials(query)?;
        debug!(
            search = ?query.search_term(),
            include_inactive = query.include_inactive,
            total = page.total,
            returned = page.items.len(),
            "物料列表查询"
        );
        Ok(page)
    }

    /// 按编码查询物料（含已停用）
    pub fn get_material(&self, code: &str) -> ApiResult<Material> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("物料编码不能为空".to_string()));
        }

        self.store
            .find_material_by_code(code)?
            .ok_or_else(|| ApiError::NotFound(format!("物料(code={})不存在", code)))
    }
}
