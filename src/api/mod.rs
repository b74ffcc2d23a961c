// ==========================================
// 物料库存对账系统 - API 层
// ==========================================
// 职责: 提供库级业务 API，供展示层 / 命令行调用
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod history_api;
pub mod import_api;
pub mod material_api;
pub mod response;

// 重导出核心类型
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use history_api::{DeleteHistoryResponse, HistoryApi};
pub use import_api::{CommitOutcome, ImportApi, PreviewResult};
pub use material_api::MaterialApi;
pub use response::ApiResponse;
