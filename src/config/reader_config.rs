// ==========================================
// 物料库存对账系统 - 表格读取配置
// ==========================================
// 职责: 列同义词集合、汇总行标记、表头扫描深度
// 说明: 规则以数据形式表达，便于测试与覆写
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 表头扫描的默认行数
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 20;

// ==========================================
// ColumnRole - 列角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Sequence,
    Code,
    Name,
    Unit,
    Lot,
    Origin,
    Quality,
    Quantity,
    UnitPrice,
    TotalValue,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 10] = [
        ColumnRole::Sequence,
        ColumnRole::Code,
        ColumnRole::Name,
        ColumnRole::Unit,
        ColumnRole::Lot,
        ColumnRole::Origin,
        ColumnRole::Quality,
        ColumnRole::Quantity,
        ColumnRole::UnitPrice,
        ColumnRole::TotalValue,
    ];

    /// 配置键后缀（reader.synonyms.<key>）
    pub fn key(&self) -> &'static str {
        match self {
            ColumnRole::Sequence => "sequence",
            ColumnRole::Code => "code",
            ColumnRole::Name => "name",
            ColumnRole::Unit => "unit",
            ColumnRole::Lot => "lot",
            ColumnRole::Origin => "origin",
            ColumnRole::Quality => "quality",
            ColumnRole::Quantity => "quantity",
            ColumnRole::UnitPrice => "unit_price",
            ColumnRole::TotalValue => "total_value",
        }
    }

    /// 必需列: 编码 + 数量
    pub fn is_required(&self) -> bool {
        matches!(self, ColumnRole::Code | ColumnRole::Quantity)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ==========================================
// ColumnSynonyms - 每个列角色的同义词集合
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSynonyms {
    pub sequence: Vec<String>,
    pub code: Vec<String>,
    pub name: Vec<String>,
    pub unit: Vec<String>,
    pub lot: Vec<String>,
    pub origin: Vec<String>,
    pub quality: Vec<String>,
    pub quantity: Vec<String>,
    pub unit_price: Vec<String>,
    pub total_value: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        Self {
            sequence: strings(&["stt", "số tt", "số thứ tự", "so tt", "so thu tu"]),
            code: strings(&["mavt", "mã vt", "mã vật tư", "ma vat tu"]),
            name: strings(&["tên vt", "ten vt", "tên vật tư", "sản phẩm", "vat tu", "diễn giải"]),
            unit: strings(&["đvt", "dvt", "đơn vị", "don vi"]),
            lot: strings(&["số lô", "so lo", "lô"]),
            origin: strings(&["nơi sx", "noi sx", "xuất xứ", "xuat xu", "vietnam"]),
            quality: strings(&["chất lượng", "chat luong", "tình trạng"]),
            quantity: strings(&[
                "soluong", "số lượng", "so luong", "sl", "thực tế", "tồn kho", "ton kho",
            ]),
            unit_price: strings(&["đơn giá", "don gia", "giá"]),
            total_value: strings(&["thành tiền", "thanh tien", "tổng tiền"]),
        }
    }
}

impl ColumnSynonyms {
    pub fn get(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Sequence => &self.sequence,
            ColumnRole::Code => &self.code,
            ColumnRole::Name => &self.name,
            ColumnRole::Unit => &self.unit,
            ColumnRole::Lot => &self.lot,
            ColumnRole::Origin => &self.origin,
            ColumnRole::Quality => &self.quality,
            ColumnRole::Quantity => &self.quantity,
            ColumnRole::UnitPrice => &self.unit_price,
            ColumnRole::TotalValue => &self.total_value,
        }
    }

    pub fn set(&mut self, role: ColumnRole, synonyms: Vec<String>) {
        let slot = match role {
            ColumnRole::Sequence => &mut self.sequence,
            ColumnRole::Code => &mut self.code,
            ColumnRole::Name => &mut self.name,
            ColumnRole::Unit => &mut self.unit,
            ColumnRole::Lot => &mut self.lot,
            ColumnRole::Origin => &mut self.origin,
            ColumnRole::Quality => &mut self.quality,
            ColumnRole::Quantity => &mut self.quantity,
            ColumnRole::UnitPrice => &mut self.unit_price,
            ColumnRole::TotalValue => &mut self.total_value,
        };
        *slot = synonyms;
    }
}

// ==========================================
// ReaderConfig - 读取器配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// 每个工作表扫描表头的行数
    pub header_scan_rows: usize,
    pub synonyms: ColumnSynonyms,
    /// 编码列包含这些子串的行视为汇总/备注行
    pub aggregate_markers: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            synonyms: ColumnSynonyms::default(),
            aggregate_markers: strings(&["tổng", "cộng", "ghi chú"]),
        }
    }
}

/// 表头文本规范化: 小写 + 去除全部空白（含不间断空格 U+00A0）
pub fn normalize_header_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{00A0}')
        .flat_map(char::to_lowercase)
        .collect()
}
