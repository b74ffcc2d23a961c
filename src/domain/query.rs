// ==========================================
// 物料库存对账系统 - 查询参数与分页结果
// ==========================================

use crate::domain::history::ImportHistory;
use crate::domain::types::{MaterialSortField, SortOrder};
use serde::{Deserialize, Serialize};

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// limit = 0 表示不分页
    pub fn new(items: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            ((total.max(0) as u64 + limit as u64 - 1) / limit as u64) as u32
        } else {
            1
        };
        Self {
            items,
            total,
            page: page.max(1),
            limit,
            total_pages,
        }
    }
}

/// 分页偏移量（页码从 1 开始）
pub fn page_offset(page: u32, limit: u32) -> u64 {
    (page.max(1) as u64 - 1) * limit as u64
}

/// 物料列表查询
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuery {
    /// 按编码/名称模糊搜索
    pub search: Option<String>,
    pub include_inactive: bool,
    pub page: u32,
    /// 0 = 返回全部
    pub limit: u32,
    pub sort_by: MaterialSortField,
    pub order: SortOrder,
}

impl Default for MaterialQuery {
    fn default() -> Self {
        Self {
            search: None,
            include_inactive: false,
            page: 1,
            limit: 50,
            sort_by: MaterialSortField::Code,
            order: SortOrder::Asc,
        }
    }
}

impl MaterialQuery {
    /// 规范化后的搜索词（空白视为未搜索）
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// 总览统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_materials: i64,
    pub active_materials: i64,
    pub inactive_materials: i64,
    /// Σ quantity × unit_price（仅在库物料，单价为空计 0）
    pub total_value: f64,
    pub recent_import: Option<ImportHistory>,
}
