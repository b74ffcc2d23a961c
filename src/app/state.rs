// ==========================================
// 物料库存对账系统 - 应用状态
// ==========================================
// 职责: 打开数据库、装配 API 实例与事件发布者
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{DashboardApi, HistoryApi, ImportApi, MaterialApi};
use crate::config::ConfigManager;
use crate::db;
use crate::engine::{BroadcastEventPublisher, OptionalEventPublisher};
use crate::importer::SpreadsheetReader;
use crate::repository::SqliteCatalogStore;

/// 应用状态
///
/// 所有 API 共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub store: Arc<SqliteCatalogStore>,

    /// 快照导入API
    pub import_api: Arc<ImportApi<SqliteCatalogStore>>,

    /// 导入历史API
    pub history_api: Arc<HistoryApi<SqliteCatalogStore>>,

    /// 物料API
    pub material_api: Arc<MaterialApi<SqliteCatalogStore>>,

    /// 总览API
    pub dashboard_api: Arc<DashboardApi<SqliteCatalogStore>>,

    /// 目录事件（提交/删除之后发布，展示层订阅后刷新）
    pub events: Arc<BroadcastEventPublisher>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// 读取配置表中的表头同义词 / 汇总标记覆盖值
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState, 数据库路径: {}", db_path);

        if let Some(parent) = PathBuf::from(&db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("无法创建数据库目录 {}: {}", parent.display(), e))?;
            }
        }

        let store = Arc::new(
            SqliteCatalogStore::open(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?,
        );

        let config = ConfigManager::from_connection(store.connection());
        let reader = SpreadsheetReader::from_config_reader(&config)
            .map_err(|e| format!("无法加载读取配置: {}", e))?;

        let events = Arc::new(BroadcastEventPublisher::default());
        let publisher = OptionalEventPublisher::with_publisher(events.clone());

        let import_api = Arc::new(ImportApi::new(
            Arc::clone(&store),
            Box::new(reader),
            publisher.clone(),
        ));
        let history_api = Arc::new(HistoryApi::new(Arc::clone(&store), publisher));
        let material_api = Arc::new(MaterialApi::new(Arc::clone(&store)));
        let dashboard_api = Arc::new(DashboardApi::new(Arc::clone(&store)));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            store,
            import_api,
            history_api,
            material_api,
            dashboard_api,
            events,
        })
    }
}

/// 默认数据库路径（STOCK_RECONCILE_DB 优先）
pub fn get_default_db_path() -> String {
    db::default_db_path().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_state_creates_nested_db_dir() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("catalog.db");

        let state = AppState::new(db_path.to_string_lossy().into_owned()).unwrap();
        assert!(db_path.exists());
        assert_eq!(state.dashboard_api.get_stats().unwrap().total_materials, 0);
    }
}
