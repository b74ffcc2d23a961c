// ==========================================
// 物料库存对账系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把读取层/仓储层错误转换为调用方可理解的结果
// 分类: 解析 / 校验 / 提交 / 撤销 / 过期 / 数据库
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 预览阶段
    // ==========================================
    /// 文件为空/无法读取/缺少必需表头
    #[error("文件解析失败: {0}")]
    ParseError(String),

    /// 解析结果不满足检测前提（如没有任何物料行）
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 提交 / 撤销
    // ==========================================
    /// 提交事务失败（已回滚），cause 供日志使用
    #[error("{message}")]
    CommitError { message: String, cause: String },

    /// 预览结果已过期，需要重新预览
    #[error("差异集合已过期 (code={code}): {message}")]
    StaleChangeSet { code: String, message: String },

    #[error("导入历史不存在: {0}")]
    HistoryNotFound(String),

    /// 撤销事务失败（已回滚），cause 供日志使用
    #[error("{message}")]
    UndoError { message: String, cause: String },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 对外错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ParseError(_) => "PARSE_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::CommitError { .. } => "COMMIT_ERROR",
            ApiError::StaleChangeSet { .. } => "STALE_CHANGE_SET",
            ApiError::HistoryNotFound(_) => "HISTORY_NOT_FOUND",
            ApiError::UndoError { .. } => "UNDO_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 提交阶段的仓储错误
    pub fn commit_failure(err: RepositoryError) -> Self {
        match err {
            RepositoryError::StaleChangeSet { code, message } => {
                ApiError::StaleChangeSet { code, message }
            }
            other => ApiError::CommitError {
                message: "导入提交失败，数据未发生任何变化".to_string(),
                cause: other.to_string(),
            },
        }
    }

    /// 删除/撤销阶段的仓储错误
    pub fn undo_failure(history_id: &str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, .. } if entity == "ImportHistory" => {
                ApiError::HistoryNotFound(history_id.to_string())
            }
            other => ApiError::UndoError {
                message: "删除导入历史失败，数据未发生任何变化".to_string(),
                cause: other.to_string(),
            },
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileReadError(_)
            | ImportError::EmptyFile
            | ImportError::UnreadableWorkbook(_)
            | ImportError::CsvParseError(_)
            | ImportError::HeaderNotFound { .. } => ApiError::ParseError(err.to_string()),
            ImportError::ConfigReadError { .. } | ImportError::ConfigValueError { .. } => {
                ApiError::InvalidInput(err.to_string())
            }
            ImportError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换（只读查询路径）
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::StaleChangeSet { code, message } => {
                ApiError::StaleChangeSet { code, message }
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_not_found_maps_to_parse_error() {
        let err: ApiError = ImportError::HeaderNotFound {
            code_column: "mavt".to_string(),
            quantity_column: "soluong".to_string(),
            scan_rows: 20,
        }
        .into();
        assert_eq!(err.code(), "PARSE_ERROR");
        assert!(err.to_string().contains("mavt"));
        assert!(err.to_string().contains("soluong"));
    }

    #[test]
    fn test_commit_failure_keeps_cause() {
        let err = ApiError::commit_failure(RepositoryError::DatabaseQueryError(
            "disk I/O error".to_string(),
        ));
        match err {
            ApiError::CommitError { cause, .. } => assert!(cause.contains("disk I/O")),
            other => panic!("unexpected: {other:?}"),
        }

        let stale = ApiError::commit_failure(RepositoryError::StaleChangeSet {
            code: "A".to_string(),
            message: "x".to_string(),
        });
        assert_eq!(stale.code(), "STALE_CHANGE_SET");
    }

    #[test]
    fn test_undo_failure_distinguishes_not_found() {
        let err = ApiError::undo_failure("H1", RepositoryError::not_found("ImportHistory", "H1"));
        assert!(matches!(err, ApiError::HistoryNotFound(ref id) if id == "H1"));

        let err = ApiError::undo_failure("H1", RepositoryError::not_found("Material", "M1"));
        assert_eq!(err.code(), "UNDO_ERROR");
    }
}
