//! Product API Handlers

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::json;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppJson, AppResult, created, no_content, ok, ok_with_message, ok_with_result};

/// 别名路由固定投影的字段集
const TOP_FIVE_FIELDS: &str = "name,price,ratings_average,category,stock";

/// 按查询参数取列表并组装信封
async fn list_with(state: ServerState, params: HashMap<String, String>) -> AppResult<Response> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.list(&params).await?;

    Ok(ok_with_result(products.len(), json!({ "products": products })))
}

// =============================================================================
// Catalog (public)
// =============================================================================

/// GET /api/products - 商品列表 (过滤/排序/投影/分页)
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    list_with(state, params).await
}

/// GET /api/products/top-5-best - 评分最高的 5 个商品
///
/// 别名路由: 在用户参数之上固定 limit/sort/fields
pub async fn top_five_best(
    State(state): State<ServerState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    params.insert("limit".to_string(), "5".to_string());
    params.insert("sort".to_string(), "-ratings_average".to_string());
    params.insert("fields".to_string(), TOP_FIVE_FIELDS.to_string());

    list_with(state, params).await
}

/// GET /api/products/top-5-Cheapest-mobile - 最便宜的 5 个手机
pub async fn top_five_cheapest_mobile(
    State(state): State<ServerState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> AppResult<Response> {
    params.insert("limit".to_string(), "5".to_string());
    params.insert("category".to_string(), "mobile".to_string());
    params.insert("sort".to_string(), "price".to_string());
    params.insert("fields".to_string(), TOP_FIVE_FIELDS.to_string());

    list_with(state, params).await
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("No product found with that ID"))?;

    Ok(ok(json!({ "product": product })))
}

// =============================================================================
// Management (admin)
// =============================================================================

/// POST /api/products - 创建商品 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<ProductCreate>,
) -> AppResult<Response> {
    payload.validate()?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo.create(payload).await?;

    tracing::info!(
        product_id = %product.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
        name = %product.name,
        "Product created"
    );

    Ok(created(
        "Product created successfully",
        json!({ "product": product }),
    ))
}

/// PATCH /api/products/:id - 更新商品 (管理员)
///
/// 只接受 name/category/price/available/description/stock/images,
/// 其余字段 (包括评分) 直接被反序列化拒绝。
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ProductUpdate>,
) -> AppResult<Response> {
    payload.validate()?;

    let repo = ProductRepository::new(state.get_db());
    let product = repo.update(&id, payload).await?;

    Ok(ok_with_message(
        "Product updated successfully",
        json!({ "product": product }),
    ))
}

/// DELETE /api/products/:id - 删除商品 (管理员)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let repo = ProductRepository::new(state.get_db());
    repo.delete(&id).await?;

    Ok(no_content())
}
