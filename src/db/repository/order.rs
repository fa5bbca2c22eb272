//! Order Repository
//!
//! 下单流程 (saga):
//! 1. 逐行校验数量、商品存在性
//! 2. 条件扣减库存 (stock >= quantity 时才生效), 失败则补偿已扣行
//! 3. 创建订单文档, 失败则补偿全部扣减
//! 4. 重新读取并返回填充后的订单
//!
//! 取消订单通过条件状态翻转保证补货只执行一次。

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Order, OrderCreateRequest, OrderDetail, OrderStatus, OrderUpdate, Product};
use crate::utils::money;

/// Order line in its write shape: the product reference is bound natively
/// so SurrealDB stores it as a record link, not a string
#[derive(Debug, Clone, Serialize)]
struct OrderLineWrite {
    product: RecordId,
    quantity: i64,
    price_at_purchase: f64,
}

/// Stock taken for a pending placement, released on failure
struct Reservation {
    product: RecordId,
    quantity: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all orders, populated, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<OrderDetail>> {
        let orders: Vec<OrderDetail> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC FETCH user, products.product")
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find one order by id, populated; malformed ids read as missing
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<OrderDetail>> {
        let record: RecordId = match id.parse() {
            Ok(record) => record,
            Err(_) => return Ok(None),
        };
        self.find_detail(record).await
    }

    async fn find_detail(&self, record: RecordId) -> RepoResult<Option<OrderDetail>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE id = $record FETCH user, products.product")
            .bind(("record", record))
            .await?;
        let order: Option<OrderDetail> = result.take(0)?;
        Ok(order)
    }

    /// Place an order for `user`
    ///
    /// Stock is reserved line by line with a conditional decrement, so two
    /// concurrent orders can never both take the last unit. Any failure
    /// after a reservation releases everything taken so far; either the
    /// order exists with all its decrements or stock is untouched.
    pub async fn create(&self, user: RecordId, data: OrderCreateRequest) -> RepoResult<OrderDetail> {
        if data.products.is_empty() {
            return Err(RepoError::Validation("Your cart is empty!".to_string()));
        }

        let mut reserved: Vec<Reservation> = Vec::new();
        let mut lines: Vec<OrderLineWrite> = Vec::with_capacity(data.products.len());
        let mut total = Decimal::ZERO;

        for line in &data.products {
            if line.quantity < 1 {
                self.release(&reserved).await;
                return Err(RepoError::Validation(
                    "Quantity must be at least 1".to_string(),
                ));
            }

            let product_id: RecordId = match line.product.parse() {
                Ok(record) => record,
                Err(_) => {
                    self.release(&reserved).await;
                    return Err(RepoError::NotFound(format!(
                        "No product found with ID {}",
                        line.product
                    )));
                }
            };

            // 商品不存在与库存不足是不同的错误, 先区分
            let product: Option<Product> = self.base.db().select(product_id.clone()).await?;
            if product.is_none() {
                self.release(&reserved).await;
                return Err(RepoError::NotFound(format!(
                    "No product found with ID {}",
                    line.product
                )));
            }

            // Conditional decrement: a no-op when stock is short
            let mut result = self
                .base
                .db()
                .query(
                    "UPDATE $product SET stock -= $quantity WHERE stock >= $quantity RETURN AFTER",
                )
                .bind(("product", product_id.clone()))
                .bind(("quantity", line.quantity))
                .await?;
            let reserved_product: Option<Product> = result.take(0)?;

            let Some(product) = reserved_product else {
                self.release(&reserved).await;
                return Err(RepoError::Validation(
                    "Store stock for this product is less than the requested quantity"
                        .to_string(),
                ));
            };

            total += money::line_total(product.price, line.quantity);
            reserved.push(Reservation {
                product: product_id.clone(),
                quantity: line.quantity,
            });
            lines.push(OrderLineWrite {
                product: product_id,
                quantity: line.quantity,
                price_at_purchase: product.price,
            });
        }

        let now = Utc::now().timestamp_millis();
        let result = self
            .base
            .db()
            .query(
                r#"CREATE order SET
                    user = $user,
                    products = $products,
                    total_amount = $total_amount,
                    order_date = $order_date,
                    status = $status,
                    shipping_address = $shipping_address,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("user", user))
            .bind(("products", lines))
            .bind(("total_amount", money::to_f64(total)))
            .bind(("order_date", now))
            .bind(("status", OrderStatus::Pending))
            .bind(("shipping_address", data.shipping_address.trim().to_string()))
            .bind(("created_at", now))
            .await;

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                self.release(&reserved).await;
                return Err(e.into());
            }
        };
        let created: Option<Order> = match response.take(0) {
            Ok(created) => created,
            Err(e) => {
                self.release(&reserved).await;
                return Err(e.into());
            }
        };
        let Some(order) = created else {
            self.release(&reserved).await;
            return Err(RepoError::Database("Failed to create order".to_string()));
        };

        let record = order
            .id
            .ok_or_else(|| RepoError::Database("Created order has no id".to_string()))?;
        self.find_detail(record)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to load created order".to_string()))
    }

    /// Update an order
    ///
    /// Moving into `cancelled` restores every line's stock exactly once:
    /// the status flip is conditional, and only the request that wins the
    /// flip performs the restock. Repeating the cancel is a stock no-op,
    /// and transitions out of `cancelled` never re-reserve stock.
    pub async fn update(&self, id: &str, data: OrderUpdate) -> RepoResult<OrderDetail> {
        let record: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("No order found with ID {}", id)))?;

        let existing: Option<Order> = self.base.db().select(record.clone()).await?;
        let existing = existing
            .ok_or_else(|| RepoError::NotFound(format!("No order found with ID {}", id)))?;

        let cancelling = data.status == Some(OrderStatus::Cancelled)
            && existing.status != OrderStatus::Cancelled;

        if cancelling {
            let mut result = self
                .base
                .db()
                .query(
                    r#"UPDATE $record SET
                        status = $status,
                        shipping_address = $shipping_address OR shipping_address
                    WHERE status != $status
                    RETURN AFTER"#,
                )
                .bind(("record", record.clone()))
                .bind(("status", OrderStatus::Cancelled))
                .bind(("shipping_address", data.shipping_address))
                .await?;
            let flipped: Option<Order> = result.take(0)?;

            // Only the winner of the flip restocks; a concurrent cancel
            // that lost finds the flip already done and skips this
            if let Some(order) = flipped {
                for line in &order.products {
                    self.base
                        .db()
                        .query("UPDATE $product SET stock += $quantity")
                        .bind(("product", line.product.clone()))
                        .bind(("quantity", line.quantity))
                        .await?
                        .check()?;
                }
                tracing::info!(
                    order_id = %record,
                    lines = order.products.len(),
                    "Order cancelled, stock restored"
                );
            }
        } else {
            self.base
                .db()
                .query("UPDATE $record MERGE $data")
                .bind(("record", record.clone()))
                .bind(("data", data))
                .await?
                .check()?;
        }

        self.find_detail(record)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("No order found with ID {}", id)))
    }

    /// Hard delete an order; stock is not restored (cancel first for that)
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("No order found with ID {}", id)))?;
        let existing: Option<Order> = self.base.db().select(record.clone()).await?;
        if existing.is_none() {
            return Err(RepoError::NotFound(format!("No order found with ID {}", id)));
        }

        self.base
            .db()
            .query("DELETE $record")
            .bind(("record", record))
            .await?;
        Ok(())
    }

    /// Best-effort release of reserved stock after a failed placement
    async fn release(&self, reserved: &[Reservation]) {
        for reservation in reserved {
            let result = self
                .base
                .db()
                .query("UPDATE $product SET stock += $quantity")
                .bind(("product", reservation.product.clone()))
                .bind(("quantity", reservation.quantity))
                .await
                .and_then(|response| response.check());
            if let Err(e) = result {
                tracing::error!(
                    target: "database",
                    product = %reservation.product,
                    quantity = reservation.quantity,
                    error = %e,
                    "Failed to release reserved stock"
                );
            }
        }
    }
}
