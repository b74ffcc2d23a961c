// ==========================================
// 物料库存对账系统 - 领域类型定义
// ==========================================
// 职责: 台账变更类型、排序字段等封闭枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 变更类型 (Change Type)
// ==========================================
// 封闭枚举: NEW / INCREASE / DECREASE / REMOVED / INFO_UPDATE
// INFO_UPDATE 仅保留在分类体系中，提交路径当前不产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    New,        // 新物料（或重新启用的已停用物料）
    Increase,   // 数量增加
    Decrease,   // 数量减少
    Removed,    // 快照中缺失，软删除
    InfoUpdate, // 仅描述字段变化
}

impl ChangeType {
    pub const ALL: [ChangeType; 5] = [
        ChangeType::New,
        ChangeType::Increase,
        ChangeType::Decrease,
        ChangeType::Removed,
        ChangeType::InfoUpdate,
    ];

    /// 数据库存储形式
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::New => "NEW",
            ChangeType::Increase => "INCREASE",
            ChangeType::Decrease => "DECREASE",
            ChangeType::Removed => "REMOVED",
            ChangeType::InfoUpdate => "INFO_UPDATE",
        }
    }

    /// 是否为数量变更（INCREASE / DECREASE）
    pub fn is_quantity_update(&self) -> bool {
        matches!(self, ChangeType::Increase | ChangeType::Decrease)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的变更类型字符串
#[derive(Debug, Clone, Error)]
#[error("未知的变更类型: {0}")]
pub struct UnknownChangeType(pub String);

impl FromStr for ChangeType {
    type Err = UnknownChangeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 兼容带引号的 JSON 写法
        let normalized = s.trim().trim_matches('"');
        ChangeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownChangeType(s.to_string()))
    }
}

// ==========================================
// 物料列表排序字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSortField {
    #[default]
    Code,
    Name,
    Quantity,
    Sequence,
}

impl MaterialSortField {
    /// 对应 material 表的排序表达式
    pub fn sql_expr(&self) -> &'static str {
        match self {
            MaterialSortField::Code => "code",
            MaterialSortField::Name => "name",
            MaterialSortField::Quantity => "quantity",
            // 序号以文本存储，优先按数值排序
            MaterialSortField::Sequence => "CAST(sequence AS REAL)",
        }
    }
}

impl FromStr for MaterialSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(MaterialSortField::Code),
            "name" => Ok(MaterialSortField::Name),
            "quantity" => Ok(MaterialSortField::Quantity),
            "sequence" | "stt" => Ok(MaterialSortField::Sequence),
            other => Err(format!("无效的排序字段: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("无效的排序方向: {}", other)),
        }
    }
}
