// ==========================================
// 物料库存对账系统 - 差异集合
// ==========================================
// 职责: 差异检测器的输出，预览与提交之间传递
// ==========================================

use crate::domain::types::ChangeType;
use serde::{Deserialize, Serialize};

/// 单个物料的分类差异
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub code: String,
    pub name: Option<String>,
    pub change_type: ChangeType,
    pub old_quantity: Option<f64>,
    pub new_quantity: Option<f64>,
    pub quantity_diff: f64,
    pub note: String,
    /// 产生该差异的快照行下标；REMOVED 为 None
    pub row_index: Option<usize>,
}

impl ChangeItem {
    fn same_classification(&self, other: &ChangeItem) -> bool {
        self.code == other.code
            && self.change_type == other.change_type
            && self.old_quantity == other.old_quantity
            && self.new_quantity == other.new_quantity
            && self.row_index == other.row_index
    }
}

/// 分类差异集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub new_items: Vec<ChangeItem>,
    pub increased_items: Vec<ChangeItem>,
    pub decreased_items: Vec<ChangeItem>,
    pub removed_items: Vec<ChangeItem>,
    pub unchanged_count: usize,
    pub total_in_file: usize,
}

impl ChangeSet {
    /// 数量更新条数（增加 + 减少）
    pub fn updated_count(&self) -> usize {
        self.increased_items.len() + self.decreased_items.len()
    }

    /// 将产生台账条目的总数
    pub fn ledger_entry_count(&self) -> usize {
        self.new_items.len() + self.updated_count() + self.removed_items.len()
    }

    pub fn has_changes(&self) -> bool {
        self.ledger_entry_count() > 0
    }

    /// 按提交顺序遍历: NEW → INCREASE → DECREASE → REMOVED
    pub fn iter(&self) -> impl Iterator<Item = &ChangeItem> {
        self.new_items
            .iter()
            .chain(self.increased_items.iter())
            .chain(self.decreased_items.iter())
            .chain(self.removed_items.iter())
    }

    /// 会计恒等式: new + increased + decreased + unchanged == total_in_file
    pub fn is_balanced(&self) -> bool {
        self.new_items.len() + self.updated_count() + self.unchanged_count == self.total_in_file
    }

    /// 分类结果是否一致（忽略备注文本）
    pub fn same_classification(&self, other: &ChangeSet) -> bool {
        fn same(a: &[ChangeItem], b: &[ChangeItem]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_classification(y))
        }

        self.unchanged_count == other.unchanged_count
            && self.total_in_file == other.total_in_file
            && same(&self.new_items, &other.new_items)
            && same(&self.increased_items, &other.increased_items)
            && same(&self.decreased_items, &other.decreased_items)
            && same(&self.removed_items, &other.removed_items)
    }

    /// 汇总文本（预览页展示）
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.new_items.is_empty() {
            parts.push(format!("{} vật tư mới", self.new_items.len()));
        }
        if !self.increased_items.is_empty() {
            parts.push(format!("{} vật tư tăng số lượng", self.increased_items.len()));
        }
        if !self.decreased_items.is_empty() {
            parts.push(format!("{} vật tư giảm số lượng", self.decreased_items.len()));
        }
        if !self.removed_items.is_empty() {
            parts.push(format!("{} vật tư hết hàng", self.removed_items.len()));
        }
        if self.unchanged_count > 0 {
            parts.push(format!("{} vật tư không đổi", self.unchanged_count));
        }

        if parts.is_empty() {
            "Không có thay đổi".to_string()
        } else {
            parts.join(" | ")
        }
    }

    /// 提交成功后的结果文本
    pub fn commit_summary(&self) -> String {
        format!(
            "Import thành công: {} mới, {} tăng, {} giảm, {} hết hàng",
            self.new_items.len(),
            self.increased_items.len(),
            self.decreased_items.len(),
            self.removed_items.len()
        )
    }
}
