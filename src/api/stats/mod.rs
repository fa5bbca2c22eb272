//! Stats API 模块 (管理员报表)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_role;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/stats", routes())
}

fn routes() -> Router<ServerState> {
    // 报表仅管理员可见
    Router::new()
        .route(
            "/products/categorystats",
            get(handler::product_category_stats),
        )
        .route("/products/stock-stats", get(handler::product_stock_stats))
        .route("/orders/categorystats", get(handler::order_category_stats))
        .route("/orders/ordercounter", get(handler::order_counter))
        .route("/orders/user-stats", get(handler::user_order_stats))
        .route("/orders/total-income", get(handler::total_income))
        .route(
            "/orders/total-income-category",
            get(handler::income_per_category),
        )
        .route(
            "/orders/most-sales-products",
            get(handler::most_sales_products),
        )
        .layer(middleware::from_fn(require_role(&["admin"])))
}
