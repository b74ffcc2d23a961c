// ==========================================
// 物料库存对账系统 - 工作表数据源
// ==========================================
// 职责: 原始字节 → 按工作表组织的类型化单元格网格
// 支持: Excel (.xlsx/.xls/.xlsb) / ODS / CSV（按文件头嗅探格式）
// 说明: 网格行号与文件行号一致（range 起点之前补空行）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// CellValue - 类型化单元格
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 单元格文本（去首尾空白，空文本视为 None）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// 整数值不带小数部分输出（编码列常被存为数字）
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// SheetGrid - 单个工作表
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    /// rows[i] 对应文件第 i + 1 行
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// 嗅探格式并读取全部工作表
pub fn read_sheets(bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ImportError::EmptyFile);
    }

    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        read_workbook(bytes)
    } else {
        read_csv(bytes)
    }
}

fn read_workbook(bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ImportError::UnreadableWorkbook("工作簿无工作表".to_string()));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook.worksheet_range(&name)?;
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
        for data_row in range.rows() {
            let mut row = vec![CellValue::Empty; start_col];
            row.extend(data_row.iter().map(CellValue::from));
            rows.push(row);
        }

        tracing::debug!(sheet = %name, rows = rows.len(), "工作表已读取");
        sheets.push(SheetGrid { name, rows });
    }

    Ok(sheets)
}

fn read_csv(bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }

    if rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    Ok(vec![SheetGrid {
        name: "csv".to_string(),
        rows,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bytes_rejected() {
        assert!(matches!(read_sheets(b""), Err(ImportError::EmptyFile)));
        assert!(matches!(read_sheets(b"  \n"), Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_csv_with_bom() {
        let bytes = "\u{FEFF}Mã VT,Số lượng\nA,\"1.234,56\"\n".as_bytes();
        let sheets = read_sheets(bytes).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].cell(0, 0).as_text().as_deref(), Some("Mã VT"));
        assert_eq!(
            sheets[0].cell(1, 1),
            &CellValue::Text("1.234,56".to_string())
        );
        assert_eq!(sheets[0].cell(5, 5), &CellValue::Empty);
    }

    #[test]
    fn test_broken_zip_is_unreadable() {
        let bytes = b"PK\x03\x04garbage";
        assert!(matches!(
            read_sheets(bytes),
            Err(ImportError::UnreadableWorkbook(_))
        ));
    }

    #[test]
    fn test_number_cell_text() {
        assert_eq!(CellValue::Number(1001.0).as_text().as_deref(), Some("1001"));
        assert_eq!(CellValue::Number(2.5).as_text().as_deref(), Some("2.5"));
        assert!(CellValue::Text("  ".to_string()).is_empty());
    }
}
