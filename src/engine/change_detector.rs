// ==========================================
// 物料库存对账系统 - 差异检测器
// ==========================================
// 职责: (快照行, 在库物料) → ChangeSet
// 红线: 纯函数，无副作用，无 I/O
// 规则:
// - 快照编码不在在库集合中 → NEW
// - 数量不同 → INCREASE / DECREASE；数量相同 → 计入 unchanged
// - 在库但未出现在快照中 → REMOVED（按目录顺序）
// - 同一编码多次出现时逐行独立对比同一份目录，不做去重
// ==========================================

use crate::domain::change_set::{ChangeItem, ChangeSet};
use crate::domain::material::{Material, MaterialRow};
use crate::domain::types::ChangeType;
use std::collections::{HashMap, HashSet};

const DEFAULT_UNIT_LABEL: &str = "đơn vị";

/// 计算快照与在库目录之间的差异
pub fn detect_changes(rows: &[MaterialRow], active_materials: &[Material]) -> ChangeSet {
    let catalog: HashMap<&str, &Material> = active_materials
        .iter()
        .filter(|m| m.active)
        .map(|m| (m.code.as_str(), m))
        .collect();

    let mut set = ChangeSet {
        total_in_file: rows.len(),
        ..Default::default()
    };
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        seen.insert(row.code.as_str());

        let Some(current) = catalog.get(row.code.as_str()) else {
            set.new_items.push(ChangeItem {
                code: row.code.clone(),
                name: row.name.clone(),
                change_type: ChangeType::New,
                old_quantity: None,
                new_quantity: Some(row.quantity),
                quantity_diff: row.quantity,
                note: format!("Vật tư mới: {}", row.display_name()),
                row_index: Some(index),
            });
            continue;
        };

        let diff = row.quantity - current.quantity;
        if diff == 0.0 {
            set.unchanged_count += 1;
            continue;
        }

        let (change_type, verb) = if diff > 0.0 {
            (ChangeType::Increase, "Tăng")
        } else {
            (ChangeType::Decrease, "Giảm")
        };
        // 单位取目录中的值，快照里的单位在提交后才生效
        let unit = current.unit.as_deref().unwrap_or(DEFAULT_UNIT_LABEL);

        let item = ChangeItem {
            code: row.code.clone(),
            name: row.name.clone().or_else(|| current.name.clone()),
            change_type,
            old_quantity: Some(current.quantity),
            new_quantity: Some(row.quantity),
            quantity_diff: diff,
            note: format!("{} {} {}", verb, diff.abs(), unit),
            row_index: Some(index),
        };

        match change_type {
            ChangeType::Increase => set.increased_items.push(item),
            _ => set.decreased_items.push(item),
        }
    }

    for material in active_materials.iter().filter(|m| m.active) {
        if seen.contains(material.code.as_str()) {
            continue;
        }
        set.removed_items.push(ChangeItem {
            code: material.code.clone(),
            name: material.name.clone(),
            change_type: ChangeType::Removed,
            old_quantity: Some(material.quantity),
            new_quantity: Some(0.0),
            quantity_diff: -material.quantity,
            note: format!("Vật tư không còn trong file: {}", material.display_name()),
            row_index: None,
        });
    }

    tracing::debug!(
        total = set.total_in_file,
        new = set.new_items.len(),
        increased = set.increased_items.len(),
        decreased = set.decreased_items.len(),
        removed = set.removed_items.len(),
        unchanged = set.unchanged_count,
        "差异检测完成"
    );

    set
}
