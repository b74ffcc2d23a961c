// ==========================================
// 物料库存对账系统 - 物料领域模型
// ==========================================
// 职责: 物料主数据、快照行、描述字段
// 红线: code 全局唯一（含已停用物料），停用物料只能被重新启用，不得重复创建
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Material - 物料主数据
// ==========================================
// 用途: 提交层写入，撤销层只改 quantity / active
// 对齐: material 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub id: String,   // 内部ID（UUID）
    pub code: String, // 物料编码（唯一）

    // ===== 描述字段 =====
    pub sequence: Option<String>, // 序号（STT）
    pub name: Option<String>,     // 物料名称
    pub unit: Option<String>,     // 计量单位
    pub lot: Option<String>,      // 批号
    pub origin: Option<String>,   // 产地
    pub quality: Option<String>,  // 质量等级

    // ===== 库存 =====
    pub quantity: f64,            // 数量（非负）
    pub unit_price: Option<f64>,  // 单价
    pub total_value: Option<f64>, // 金额
    pub active: bool,             // 是否在库（软删除标志）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// 由快照行创建新物料（active = true）
    pub fn from_row(row: &MaterialRow, now: DateTime<Utc>) -> Self {
        let mut material = Self {
            id: Uuid::new_v4().to_string(),
            code: row.code.clone(),
            sequence: None,
            name: None,
            unit: None,
            lot: None,
            origin: None,
            quality: None,
            quantity: row.quantity,
            unit_price: None,
            total_value: None,
            active: true,
            created_at: now,
            updated_at: now,
        };
        material.apply_details(&MaterialDetails::from_row(row));
        material
    }

    /// 覆盖描述字段（不触碰 quantity / active）
    pub fn apply_details(&mut self, details: &MaterialDetails) {
        self.sequence = details.sequence.clone();
        self.name = details.name.clone();
        self.unit = details.unit.clone();
        self.lot = details.lot.clone();
        self.origin = details.origin.clone();
        self.quality = details.quality.clone();
        self.unit_price = details.unit_price;
        self.total_value = details.total_value;
    }

    /// 显示名称（名称缺失时回退到编码）
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }
}

// ==========================================
// MaterialRow - 快照行（读取器输出）
// ==========================================
// 生命周期: 预览 → 提交，解析时完成校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub row_number: usize, // 文件中的行号（从 1 开始）
    pub sequence: Option<String>,
    pub code: String,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub lot: Option<String>,
    pub origin: Option<String>,
    pub quality: Option<String>,
    pub quantity: f64,
    pub unit_price: Option<f64>,
    pub total_value: Option<f64>,
}

impl MaterialRow {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }
}

// ==========================================
// MaterialDetails - 描述字段集合
// ==========================================
// 数量未变化的行只刷新这些字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialDetails {
    pub sequence: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub lot: Option<String>,
    pub origin: Option<String>,
    pub quality: Option<String>,
    pub unit_price: Option<f64>,
    pub total_value: Option<f64>,
}

impl MaterialDetails {
    pub fn from_row(row: &MaterialRow) -> Self {
        Self {
            sequence: row.sequence.clone(),
            name: row.name.clone(),
            unit: row.unit.clone(),
            lot: row.lot.clone(),
            origin: row.origin.clone(),
            quality: row.quality.clone(),
            unit_price: row.unit_price,
            total_value: row.total_value,
        }
    }
}
