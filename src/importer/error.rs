// ==========================================
// 物料库存对账系统 - 读取层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 读取层错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件为空")]
    EmptyFile,

    #[error("工作簿无法解析: {0}")]
    UnreadableWorkbook(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 表头识别错误 =====
    #[error("未找到表头: 任一工作表的前 {scan_rows} 行中均未同时出现 {code_column} 列与 {quantity_column} 列")]
    HeaderNotFound {
        code_column: String,
        quantity_column: String,
        scan_rows: usize,
    },

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于“文件内容无法识别”一类（对外统一报告为解析错误）
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyFile
                | ImportError::UnreadableWorkbook(_)
                | ImportError::CsvParseError(_)
                | ImportError::HeaderNotFound { .. }
        )
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::UnreadableWorkbook(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
