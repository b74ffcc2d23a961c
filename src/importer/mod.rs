// ==========================================
// 物料库存对账系统 - 读取层
// ==========================================
// 职责: 快照文件 → 类型化物料行
// 支持: Excel / ODS / CSV
// ==========================================

// 模块声明
pub mod error;
pub mod header_locator;
pub mod material_reader;
pub mod number_parser;
pub mod sheet_source;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use header_locator::{ColumnMap, HeaderLocator, HeaderMatch};
pub use material_reader::{SnapshotReader, SpreadsheetReader};
pub use number_parser::parse_locale_number;
pub use sheet_source::{read_sheets, CellValue, SheetGrid};
