// ==========================================
// 物料库存对账系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供存储端口及其实现,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_store;
pub mod error;
#[cfg(test)]
pub(crate) mod memory_catalog;
pub mod sqlite_catalog;

// 重导出核心仓储
pub use catalog_store::{CatalogStore, CatalogTx};
pub use error::{RepositoryError, RepositoryResult};
pub use sqlite_catalog::{SqliteCatalogStore, SqliteCatalogTx};
