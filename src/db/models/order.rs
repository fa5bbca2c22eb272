//! Order Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::product::Product;
use super::serde_helpers;
use super::user::UserResponse;

/// Order ID type
pub type OrderId = RecordId;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Order line with the unit price snapshotted at purchase time
///
/// 下单后商品价格变动不影响已有订单。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub quantity: i64,
    pub price_at_purchase: f64,
}

/// Order model matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<OrderId>,
    #[serde(with = "serde_helpers::record_id")]
    pub user: RecordId,
    pub products: Vec<OrderLine>,
    pub total_amount: f64,
    pub order_date: i64,
    #[serde(default)]
    pub status: OrderStatus,
    pub shipping_address: String,
    pub created_at: i64,
}

/// Populated order line: the product link resolved to the full document
/// (`None` when the product was deleted after the order was placed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineDetail {
    #[serde(default)]
    pub product: Option<Product>,
    pub quantity: i64,
    pub price_at_purchase: f64,
}

/// Populated order as returned by the read endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub user: Option<UserResponse>,
    pub products: Vec<OrderLineDetail>,
    pub total_amount: f64,
    pub order_date: i64,
    #[serde(default)]
    pub status: OrderStatus,
    pub shipping_address: String,
    pub created_at: i64,
}

/// Order placement payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreateRequest {
    #[serde(default)]
    pub products: Vec<OrderLineInput>,
    #[validate(length(min = 1, message = "Shipping address is required"))]
    pub shipping_address: String,
}

/// One requested line, product id as sent by the client
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub product: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Update order payload: the only fields an admin may patch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
}
