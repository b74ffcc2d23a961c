// ==========================================
// 物料库存对账系统 - 配置层
// ==========================================
// 职责: 表格读取规则（同义词/汇总标记/扫描深度）及其覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod reader_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
pub use reader_config::{normalize_header_text, ColumnRole, ColumnSynonyms, ReaderConfig};
