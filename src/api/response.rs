// ==========================================
// 物料库存对账系统 - 统一响应结构
// ==========================================
// 职责: 把 ApiResult 折叠为可序列化的成功/失败结果，错误不外泄为异常
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error_code: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error_code: None,
        }
    }

    /// 失败结果；带 cause 的错误把原因写入日志，不返回给调用方
    pub fn error(err: ApiError) -> Self {
        match &err {
            ApiError::CommitError { cause, .. } | ApiError::UndoError { cause, .. } => {
                tracing::error!(code = err.code(), cause = %cause, "{}", err);
            }
            _ => tracing::warn!(code = err.code(), "{}", err),
        }

        Self {
            success: false,
            data: None,
            message: Some(err.to_string()),
            error_code: Some(err.code().to_string()),
        }
    }

    pub fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::error(err),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// 序列化为 JSON（序列化失败时退化为错误结果）
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "message": e.to_string(),
                "error_code": "INTERNAL_ERROR",
            })
            .to_string()
        })
    }
}
