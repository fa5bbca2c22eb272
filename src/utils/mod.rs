//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型
//! - [`ApiResponse`] - API 成功响应信封
//! - [`AppJson`] - 带信封化错误的 JSON 提取器
//! - 日志、金额计算等工具

pub mod error;
pub mod extract;
pub mod logger;
pub mod money;
pub mod result;

pub use error::{ApiResponse, AppError};
pub use error::{created, no_content, ok, ok_with_message, ok_with_result};
pub use extract::AppJson;
pub use result::AppResult;
