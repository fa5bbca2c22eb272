//! 服务层 - 服务器核心服务
//!
//! # 服务列表
//!
//! - [`HttpService`] - HTTP 服务器

pub mod http;

pub use http::HttpService;
