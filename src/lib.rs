// ==========================================
// 物料库存对账系统 - 核心库
// ==========================================
// 流程: 快照文件 → 读取 → 差异检测 → 事务提交（台账）→ 历史 / 撤销
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 存储端口与实现
pub mod repository;

// 引擎层 - 差异检测 / 提交 / 撤销
pub mod engine;

// 导入层 - 快照读取
pub mod importer;

// 配置层 - 表头同义词等读取配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    ChangeItem, ChangeSet, ChangeType, ImportHistory, Material, MaterialChange, MaterialRow,
};

pub use engine::{detect_changes, HistoryManager, ImportCommitter};

pub use api::{ApiError, ApiResponse, DashboardApi, HistoryApi, ImportApi, MaterialApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "物料库存对账系统";
