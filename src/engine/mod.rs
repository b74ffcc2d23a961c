// ==========================================
// 物料库存对账系统 - 引擎层
// ==========================================
// 职责: 差异检测、事务提交、历史撤销
// 红线: Engine 不拼 SQL，只通过存储端口访问数据
// ==========================================

pub mod change_detector;
pub mod events;
pub mod history_manager;
pub mod import_committer;

// 重导出核心引擎
pub use change_detector::detect_changes;
pub use events::{
    BroadcastEventPublisher, CatalogEvent, CatalogEventPublisher, CatalogEventType,
    NoOpEventPublisher, OptionalEventPublisher,
};
pub use history_manager::{DeleteOutcome, HistoryManager};
pub use import_committer::{CommitReport, ImportCommitter};
