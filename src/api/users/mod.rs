//! User API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    // 注册/登录：公共路由 (require_auth 的白名单放行)
    let public_routes = Router::new()
        .route("/signup", post(handler::signup))
        .route("/login", post(handler::login));

    // 用户列表：仅管理员可用
    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_admin));

    public_routes.merge(admin_routes)
}
