// ==========================================
// 物料库存对账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、差异集合
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod change_set;
pub mod history;
pub mod material;
pub mod query;
pub mod types;

// 重导出核心类型
pub use change_set::{ChangeItem, ChangeSet};
pub use history::{ImportHistory, ImportHistorySummary, MaterialChange, MaterialChangeDetail};
pub use material::{Material, MaterialDetails, MaterialRow};
pub use query::{DashboardStats, MaterialQuery, Page};
pub use types::{ChangeType, MaterialSortField, SortOrder, UnknownChangeType};
