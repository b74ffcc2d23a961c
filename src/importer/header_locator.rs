// ==========================================
// 物料库存对账系统 - 表头定位
// ==========================================
// 规则:
// - 依次扫描每个工作表的前 N 行
// - 规范化后的单元格文本包含某同义词即视为匹配
// - 同一行同时匹配编码列与数量列即为表头，首个命中即停止
// - 可选列在表头行内按同一规则定位，已占用的列不再分配
// ==========================================

use crate::config::reader_config::{normalize_header_text, ColumnRole, ReaderConfig};
use crate::importer::sheet_source::SheetGrid;
use std::collections::HashMap;

/// 表头行中各列角色的列下标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indexes: HashMap<ColumnRole, usize>,
}

impl ColumnMap {
    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.indexes.get(&role).copied()
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// 表头定位结果
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub sheet_index: usize,
    pub sheet_name: String,
    /// 表头所在行（网格下标，从 0 开始）
    pub header_row: usize,
    pub columns: ColumnMap,
}

pub struct HeaderLocator {
    scan_rows: usize,
    synonyms: Vec<(ColumnRole, Vec<String>)>,
}

impl HeaderLocator {
    pub fn new(config: &ReaderConfig) -> Self {
        // 必需列优先分配
        let mut roles: Vec<ColumnRole> = ColumnRole::ALL
            .iter()
            .copied()
            .filter(ColumnRole::is_required)
            .collect();
        roles.extend(ColumnRole::ALL.iter().copied().filter(|r| !r.is_required()));

        let synonyms = roles
            .into_iter()
            .map(|role| {
                let normalized = config
                    .synonyms
                    .get(role)
                    .iter()
                    .map(|s| normalize_header_text(s))
                    .filter(|s| !s.is_empty())
                    .collect();
                (role, normalized)
            })
            .collect();

        Self {
            scan_rows: config.header_scan_rows,
            synonyms,
        }
    }

    pub fn scan_rows(&self) -> usize {
        self.scan_rows
    }

    /// 在全部工作表中定位表头
    pub fn locate(&self, sheets: &[SheetGrid]) -> Option<HeaderMatch> {
        for (sheet_index, sheet) in sheets.iter().enumerate() {
            for (row_index, row) in sheet.rows.iter().take(self.scan_rows).enumerate() {
                if let Some(columns) = self.match_row(row_texts(row)) {
                    tracing::debug!(
                        sheet = %sheet.name,
                        row = row_index + 1,
                        columns = columns.len(),
                        "已定位表头"
                    );
                    return Some(HeaderMatch {
                        sheet_index,
                        sheet_name: sheet.name.clone(),
                        header_row: row_index,
                        columns,
                    });
                }
            }
        }
        None
    }

    fn match_row(&self, cells: Vec<String>) -> Option<ColumnMap> {
        let mut indexes = HashMap::new();

        for (role, synonyms) in &self.synonyms {
            let found = cells.iter().enumerate().find(|(col, text)| {
                !text.is_empty()
                    && !indexes.values().any(|used| used == col)
                    && synonyms.iter().any(|s| text.contains(s.as_str()))
            });

            match found {
                Some((col, _)) => {
                    indexes.insert(*role, col);
                }
                None if role.is_required() => return None,
                None => {}
            }
        }

        Some(ColumnMap { indexes })
    }
}

fn row_texts(row: &[crate::importer::sheet_source::CellValue]) -> Vec<String> {
    row.iter()
        .map(|cell| {
            cell.as_text()
                .map(|t| normalize_header_text(&t))
                .unwrap_or_default()
        })
        .collect()
}
