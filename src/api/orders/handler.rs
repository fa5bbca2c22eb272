//! Order API Handlers

use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};
use serde_json::json;
use surrealdb::RecordId;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{OrderCreateRequest, OrderUpdate};
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppJson, AppResult, created, no_content, ok, ok_with_result};

/// POST /api/orders - 下单
///
/// 逐行扣减库存, 任何一行失败都会把已扣减的行补回去,
/// 详见 [`OrderRepository::create`]。
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    AppJson(payload): AppJson<OrderCreateRequest>,
) -> AppResult<Response> {
    if payload.products.is_empty() {
        return Err(AppError::validation("Your cart is empty!"));
    }
    payload.validate()?;

    // 中间件注入的 id 来自数据库记录, 解析失败属于内部错误
    let user: RecordId = current_user
        .id
        .parse()
        .map_err(|_| AppError::internal(format!("Malformed user id: {}", current_user.id)))?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo.create(user, payload).await?;

    tracing::info!(
        order_id = %order.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
        user_id = %current_user.id,
        total_amount = order.total_amount,
        "Order placed"
    );

    Ok(created("Order placed successfully", json!({ "order": order })))
}

/// GET /api/orders/:id - 查看单个订单
///
/// 普通用户只能查看自己的订单, 管理员不受限制。
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("No order found with that ID"))?;

    if !current_user.is_admin() {
        let owner_id = order
            .user
            .as_ref()
            .and_then(|u| u.id.as_ref())
            .map(|t| t.to_string())
            .unwrap_or_default();
        if owner_id != current_user.id {
            return Err(AppError::forbidden(
                "You are not allowed to view this order",
            ));
        }
    }

    Ok(ok(json!({ "order": order })))
}

/// GET /api/orders - 获取所有订单 (管理员)
pub async fn list(State(state): State<ServerState>) -> AppResult<Response> {
    let repo = OrderRepository::new(state.get_db());
    let orders = repo.find_all().await?;

    Ok(ok_with_result(orders.len(), json!({ "orders": orders })))
}

/// PATCH /api/orders/:id - 更新订单 (管理员)
///
/// 只接受 status/shipping_address。改为 cancelled 时把各行数量补回库存,
/// 重复取消不再补货。
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<OrderUpdate>,
) -> AppResult<Response> {
    let repo = OrderRepository::new(state.get_db());
    let order = repo.update(&id, payload).await?;

    Ok(ok(json!({ "order": order })))
}

/// DELETE /api/orders/:id - 删除订单 (管理员)
///
/// 只删记录, 不回补库存。
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let repo = OrderRepository::new(state.get_db());
    repo.delete(&id).await?;

    Ok(no_content())
}
