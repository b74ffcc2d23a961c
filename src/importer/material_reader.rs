// ==========================================
// 物料库存对账系统 - 快照读取器
// ==========================================
// 职责: 原始字节 → 有序 MaterialRow 序列
// 流程: 读取工作表 → 定位表头 → 逐行抽取（跳过空编码/汇总行）
// 红线: 找不到表头时整体失败，不返回部分结果
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::reader_config::{ColumnRole, ReaderConfig};
use crate::domain::material::MaterialRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_locator::{HeaderLocator, HeaderMatch};
use crate::importer::number_parser::parse_locale_number;
use crate::importer::sheet_source::{read_sheets, CellValue, SheetGrid};

// ==========================================
// SnapshotReader Trait
// ==========================================
// 实现者: SpreadsheetReader
pub trait SnapshotReader: Send + Sync {
    /// 解析快照文件
    ///
    /// # 返回
    /// - Ok(Vec<MaterialRow>): 按文件顺序排列的物料行
    /// - Err(ImportError): 文件为空/无法解析/未找到表头
    fn read_rows(&self, bytes: &[u8]) -> ImportResult<Vec<MaterialRow>>;
}

pub struct SpreadsheetReader {
    config: ReaderConfig,
    locator: HeaderLocator,
    markers: Vec<String>,
}

impl SpreadsheetReader {
    pub fn new(config: ReaderConfig) -> Self {
        let locator = HeaderLocator::new(&config);
        let markers = config
            .aggregate_markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            config,
            locator,
            markers,
        }
    }

    /// 从配置源（config_kv 或静态配置）构造
    pub fn from_config_reader(source: &dyn ImportConfigReader) -> ImportResult<Self> {
        Ok(Self::new(source.load_reader_config()?))
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    fn header_not_found(&self) -> ImportError {
        let first = |role: ColumnRole| {
            self.config
                .synonyms
                .get(role)
                .first()
                .cloned()
                .unwrap_or_else(|| role.key().to_string())
        };

        ImportError::HeaderNotFound {
            code_column: first(ColumnRole::Code),
            quantity_column: first(ColumnRole::Quantity),
            scan_rows: self.locator.scan_rows(),
        }
    }

    fn is_aggregate_row(&self, code: &str) -> bool {
        let lowered = code.to_lowercase();
        self.markers.iter().any(|m| lowered.contains(m.as_str()))
    }

    fn extract_rows(&self, sheet: &SheetGrid, header: &HeaderMatch) -> Vec<MaterialRow> {
        let columns = &header.columns;
        let text = |row: usize, role: ColumnRole| {
            columns
                .get(role)
                .and_then(|col| sheet.cell(row, col).as_text())
        };
        let number = |row: usize, role: ColumnRole| {
            columns
                .get(role)
                .and_then(|col| numeric_value(sheet.cell(row, col)))
        };

        let mut rows = Vec::new();
        let mut skipped_aggregate = 0usize;

        for row in (header.header_row + 1)..sheet.rows.len() {
            let code = match text(row, ColumnRole::Code) {
                Some(code) => code,
                None => continue,
            };

            if self.is_aggregate_row(&code) {
                skipped_aggregate += 1;
                continue;
            }

            rows.push(MaterialRow {
                row_number: row + 1,
                sequence: text(row, ColumnRole::Sequence),
                code,
                name: text(row, ColumnRole::Name),
                unit: text(row, ColumnRole::Unit),
                lot: text(row, ColumnRole::Lot),
                origin: text(row, ColumnRole::Origin),
                quality: text(row, ColumnRole::Quality),
                quantity: number(row, ColumnRole::Quantity).unwrap_or(0.0),
                // 单价/金额为 0 视为未提供
                unit_price: number(row, ColumnRole::UnitPrice).filter(|v| *v != 0.0),
                total_value: number(row, ColumnRole::TotalValue).filter(|v| *v != 0.0),
            });
        }

        if skipped_aggregate > 0 {
            tracing::debug!(skipped = skipped_aggregate, "已跳过汇总/备注行");
        }

        rows
    }
}

impl SnapshotReader for SpreadsheetReader {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    fn read_rows(&self, bytes: &[u8]) -> ImportResult<Vec<MaterialRow>> {
        let sheets = read_sheets(bytes)?;

        let header = self.locator.locate(&sheets).ok_or_else(|| {
            tracing::warn!(sheets = sheets.len(), "未找到表头");
            self.header_not_found()
        })?;

        let sheet = &sheets[header.sheet_index];
        let rows = self.extract_rows(sheet, &header);

        tracing::info!(
            sheet = %header.sheet_name,
            header_row = header.header_row + 1,
            rows = rows.len(),
            "快照解析完成"
        );
        Ok(rows)
    }
}

/// 数字单元格原样返回，文本单元格按区域格式解析
fn numeric_value(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Empty => None,
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_locale_number(s),
    }
}
