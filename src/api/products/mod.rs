//! Product API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    // 目录浏览：公共路由 (require_auth 放行 GET /api/products...)
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/top-5-best", get(handler::top_five_best))
        .route(
            // 历史遗留的大小写, 客户端已经依赖这个拼法
            "/top-5-Cheapest-mobile",
            get(handler::top_five_cheapest_mobile),
        )
        .route("/{id}", get(handler::get_by_id));

    // 管理路由：仅管理员可用
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route(
            "/{id}",
            axum::routing::patch(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(manage_routes)
}
