//! Order API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 已登录用户：下单、查看自己的订单 (属主检查在 handler 内)
    let user_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id));

    // 管理路由：订单总览和修改仅管理员可用
    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .route(
            "/{id}",
            axum::routing::patch(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(admin_routes)
}
