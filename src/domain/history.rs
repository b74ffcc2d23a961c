// ==========================================
// 物料库存对账系统 - 导入历史与变更台账
// ==========================================
// 红线: 台账条目写入后不可修改；删除 ImportHistory 级联删除其 MaterialChange
// 对齐: import_history / material_change 表
// ==========================================

use crate::domain::types::ChangeType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportHistory - 一次对账导入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHistory {
    pub id: String,
    pub file_name: String,
    pub imported_at: DateTime<Utc>,
    pub total_items: i64,   // 文件中的行数
    pub new_items: i64,     // 新增
    pub updated_items: i64, // 增加 + 减少
    pub removed_items: i64, // 软删除
}

/// 历史列表项（附带台账条目数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHistorySummary {
    #[serde(flatten)]
    pub history: ImportHistory,
    pub change_count: i64,
}

// ==========================================
// MaterialChange - 台账条目
// ==========================================
// 不变量: quantity_diff = new_quantity - old_quantity（两者均有值时）
//         REMOVED: new_quantity = 0, quantity_diff = -old_quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialChange {
    pub id: String,
    pub import_id: String,
    pub material_id: String,
    pub change_type: ChangeType,
    pub old_quantity: Option<f64>,
    pub new_quantity: Option<f64>,
    pub quantity_diff: Option<f64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 台账明细（附带物料编码/名称，按编码排序展示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialChangeDetail {
    #[serde(flatten)]
    pub change: MaterialChange,
    pub material_code: String,
    pub material_name: Option<String>,
    pub unit: Option<String>,
}
