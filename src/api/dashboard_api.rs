// ==========================================
// 物料库存对账系统 - 总览 API
// ==========================================
// 职责: 物料总数 / 在库数 / 停用数 / 在库总金额 / 最近一次导入
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::query::DashboardStats;
use crate::repository::catalog_store::CatalogStore;

pub struct DashboardApi<S: CatalogStore> {
    store: Arc<S>,
}

impl<S: CatalogStore> DashboardApi<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn get_stats(&self) -> ApiResult<DashboardStats> {
        Ok(self.store.dashboard_stats()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_catalog::InMemoryCatalogStore;

    #[test]
    fn test_empty_catalog_stats() {
        let api = DashboardApi::new(Arc::new(InMemoryCatalogStore::new()));
        let stats = api.get_stats().unwrap();
        assert_eq!(stats.total_materials, 0);
        assert_eq!(stats.total_value, 0.0);
        assert!(stats.recent_import.is_none());
    }
}
