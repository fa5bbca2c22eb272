//! Stats API Handlers
//!
//! 每个报表就是一条 SurrealQL 聚合查询。订单行报表先用 SPLIT 把
//! `products` 数组拆成行, 再经记录链接取远端字段; 链接目标已被删除的
//! 行 (category/name/username 取出 NONE) 在分组前过滤掉。

use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok, ok_with_result};

// ============================================================================
// Response Types
// ============================================================================

/// 按分类的商品统计 (仅评分 >= 4.5 的商品)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStatsRow {
    pub category: String,
    pub num_products: i64,
    pub avg_ratings: f64,
    pub max_price: f64,
    pub min_price: f64,
}

/// 按分类的库存总量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockStatsRow {
    pub category: String,
    pub total_stock: i64,
}

/// 按分类卖出的订单行数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCategoryRow {
    pub category: String,
    pub number_of_sold_items: i64,
}

/// 订单总数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCounterRow {
    pub total: i64,
}

/// 每个用户的订单数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsRow {
    pub userid: String,
    pub username: String,
    pub user_email: String,
    pub number_of_orders: i64,
}

/// 全部订单的销售总额
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalIncomeRow {
    pub total_sales_amount: f64,
}

/// 按分类的销售额 (单价快照 * 数量)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryIncomeRow {
    pub category: String,
    pub total_income: f64,
}

/// 最畅销商品 (按售出数量)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostSalesRow {
    pub product: String,
    pub product_name: String,
    pub total_sold: i64,
}

// ============================================================================
// Product Reports
// ============================================================================

/// GET /api/stats/products/categorystats - 高评分商品的分类统计
pub async fn product_category_stats(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query(
            r#"
            SELECT
                string::uppercase(<string>category) AS category,
                count() AS num_products,
                math::fixed(math::mean(ratings_average), 2) AS avg_ratings,
                math::max(price) AS max_price,
                math::min(price) AS min_price
            FROM product
            WHERE ratings_average >= 4.5
            GROUP BY category
            ORDER BY avg_ratings DESC
        "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let stats: Vec<CategoryStatsRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "stats": stats })))
}

/// GET /api/stats/products/stock-stats - 在售商品按分类的库存总量
pub async fn product_stock_stats(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query(
            r#"
            SELECT
                string::uppercase(<string>category) AS category,
                math::sum(stock) AS total_stock
            FROM product
            WHERE available = true
            GROUP BY category
            ORDER BY total_stock ASC
        "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let stats: Vec<StockStatsRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "stats": stats })))
}

// ============================================================================
// Order Reports
// ============================================================================

/// GET /api/stats/orders/categorystats - 按商品分类统计卖出的订单行数
pub async fn order_category_stats(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query(
            r#"
            SELECT
                category,
                count() AS number_of_sold_items
            FROM (
                SELECT products.product.category AS category
                FROM order SPLIT products
            )
            WHERE category != NONE
            GROUP BY category
            ORDER BY number_of_sold_items DESC
        "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let stats: Vec<OrderCategoryRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "stats": stats })))
}

/// GET /api/stats/orders/ordercounter - 订单总数
///
/// 空表返回空数组而不是 `[{total: 0}]`。
pub async fn order_counter(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query("SELECT count() AS total FROM order GROUP ALL")
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let stats: Vec<OrderCounterRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "stats": stats })))
}

/// GET /api/stats/orders/user-stats - 每个用户的订单数
pub async fn user_order_stats(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query(
            r#"
            SELECT
                <string>user AS userid,
                user.username AS username,
                user.email AS user_email,
                count() AS number_of_orders
            FROM order
            WHERE user.username != NONE
            GROUP BY userid, username, user_email
            ORDER BY number_of_orders DESC
        "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let stats: Vec<UserStatsRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "stats": stats })))
}

/// GET /api/stats/orders/total-income - 全部订单的销售总额
pub async fn total_income(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query("SELECT math::sum(total_amount) AS total_sales_amount FROM order GROUP ALL")
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let income: Vec<TotalIncomeRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "income": income })))
}

/// GET /api/stats/orders/total-income-category - 按分类的销售额
///
/// 行收入 = price_at_purchase * quantity
pub async fn income_per_category(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query(
            r#"
            SELECT
                category,
                math::sum(line_income) AS total_income
            FROM (
                SELECT
                    products.product.category AS category,
                    products.price_at_purchase * products.quantity AS line_income
                FROM order SPLIT products
            )
            WHERE category != NONE
            GROUP BY category
            ORDER BY total_income DESC
        "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let income: Vec<CategoryIncomeRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok_with_result(income.len(), json!({ "income": income })))
}

/// GET /api/stats/orders/most-sales-products - 最畅销的 10 个商品
pub async fn most_sales_products(State(state): State<ServerState>) -> AppResult<Response> {
    let mut result = state
        .db
        .query(
            r#"
            SELECT
                product,
                product_name,
                math::sum(quantity) AS total_sold
            FROM (
                SELECT
                    <string>products.product AS product,
                    products.product.name AS product_name,
                    products.quantity AS quantity
                FROM order SPLIT products
            )
            WHERE product_name != NONE
            GROUP BY product, product_name
            ORDER BY total_sold DESC
            LIMIT 10
        "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let stats: Vec<MostSalesRow> = result
        .take(0)
        .map_err(|e| AppError::database(e.to_string()))?;

    Ok(ok(json!({ "stats": stats })))
}
