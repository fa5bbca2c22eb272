//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`users`] - 用户注册/登录/列表接口
//! - [`products`] - 商品目录接口
//! - [`orders`] - 订单接口
//! - [`stats`] - 管理员统计报表接口

pub mod health;
pub mod users;

// Data models API
pub mod orders;
pub mod products;
pub mod stats;

// Re-export common types for handlers
pub use crate::utils::{AppResult, ok, ok_with_result};
