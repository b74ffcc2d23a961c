// ==========================================
// 物料库存对账系统 - SQLite 目录仓储
// ==========================================
// 对齐: material / import_history / material_change 表
// 红线: 写事务使用 BEGIN IMMEDIATE，并在连接互斥锁内执行
// ==========================================

mod core;
mod queries;
mod tx;

#[cfg(test)]
mod tests;

pub use self::core::SqliteCatalogStore;
pub use tx::SqliteCatalogTx;
