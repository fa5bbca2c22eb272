//! 统一错误处理
//!
//! 提供应用级错误类型和响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`ApiResponse`] - API 成功响应信封
//!
//! # 响应信封
//!
//! 成功:
//! ```json
//! { "status": "success", "result": 3, "data": { "products": [...] } }
//! ```
//!
//! 失败 (4xx 为 "fail", 5xx 为 "error"):
//! ```json
//! { "status": "fail", "message": "No product found with that ID" }
//! ```
//!
//! # 使用示例
//!
//! ```ignore
//! // 返回错误
//! Err(AppError::not_found("No product found with that ID"))
//!
//! // 返回成功响应
//! Ok(ok(json!({ "product": product })))
//! ```

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::auth::jwt::JwtError;
use crate::db::repository::RepoError;

/// API 成功响应信封
///
/// 字段按需出现: 列表接口带 `result` (元素数量), 认证接口带 `token`,
/// 创建/更新接口带 `message`。
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// 固定为 "success"
    pub status: &'static str,
    /// JWT (仅注册/登录)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// 列表元素数量
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<usize>,
    /// 人类可读消息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn with_data(data: Value) -> Self {
        Self {
            status: "success",
            token: None,
            result: None,
            message: None,
            data: Some(data),
        }
    }
}

/// 应用错误枚举
///
/// # 错误分类
///
/// | 分类 | 状态码 |
/// |------|--------|
/// | 验证错误 (含重复值、未知字段) | 400 |
/// | 认证错误 (未登录、令牌过期/无效/失效) | 401 |
/// | 权限错误 | 403 |
/// | 资源不存在 (含格式错误的 ID、未匹配路由) | 404 |
/// | 系统错误 | 500 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 验证错误 (400) ==========
    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    // ========== 认证错误 (401) ==========
    #[error("Unauthorized: {0}")]
    /// 未认证 (401)
    Unauthorized(String),

    #[error("Token expired")]
    /// 令牌过期 (401)
    TokenExpired,

    #[error("Invalid token")]
    /// 无效令牌 (401)
    InvalidToken,

    // ========== 权限错误 (403) ==========
    #[error("Permission denied: {0}")]
    /// 无权限 (403)
    Forbidden(String),

    // ========== 资源错误 (404) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),

            // Authentication errors (401)
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "Your token has expired! Please log in again.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid token. Please log in again!".to_string(),
            ),

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went very wrong!".to_string(),
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went very wrong!".to_string(),
                )
            }
        };

        // 4xx 客户端错误为 "fail", 5xx 服务端错误为 "error"
        let label = if status.is_server_error() {
            "error"
        } else {
            "fail"
        };

        let body = Json(serde_json::json!({
            "status": label,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            // Duplicate values are reported like any other validation failure
            RepoError::Duplicate(msg) => AppError::Validation(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken => AppError::TokenExpired,
            JwtError::InvalidToken(_) | JwtError::InvalidSignature => AppError::InvalidToken,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = Vec::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                match &err.message {
                    Some(msg) => messages.push(msg.to_string()),
                    None => messages.push(format!("Invalid value for field '{}'", field)),
                }
            }
        }
        AppError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an invalid credentials error with unified message
    /// Used to prevent username enumeration during login
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized("Incorrect username or password".to_string())
    }
}

// ========== Helper functions ==========

/// 200 with data
pub fn ok(data: Value) -> Response {
    (StatusCode::OK, Json(ApiResponse::with_data(data))).into_response()
}

/// 200 with element count and data (list endpoints)
pub fn ok_with_result(result: usize, data: Value) -> Response {
    let body = ApiResponse {
        result: Some(result),
        ..ApiResponse::with_data(data)
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// 200 with message and data
pub fn ok_with_message(message: impl Into<String>, data: Value) -> Response {
    let body = ApiResponse {
        message: Some(message.into()),
        ..ApiResponse::with_data(data)
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// 201 with message and data
pub fn created(message: impl Into<String>, data: Value) -> Response {
    let body = ApiResponse {
        message: Some(message.into()),
        ..ApiResponse::with_data(data)
    };
    (StatusCode::CREATED, Json(body)).into_response()
}

/// 204 with empty body
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
