//! 管理员报表端到端测试
//!
//! 种子数据全部经由公开 API 写入 (注册、建品、下单), 报表结果
//! 与手工计算的期望值逐字段比对。涉及 WHERE + ORDER 的报表先按
//! 分类名排序再断言, 不依赖服务端的返回顺序。

mod common;

use common::{TestServer, order_line, product_body};
use http::StatusCode;
use serde_json::{Value, json};

/// 取出报表行并按分类名排序, 便于做确定性的整行比对
fn rows_by_category(body: &Value, key: &str) -> Vec<Value> {
    let mut rows = body["data"][key].as_array().expect("report rows").clone();
    rows.sort_by(|a, b| {
        a["category"]
            .as_str()
            .unwrap()
            .cmp(b["category"].as_str().unwrap())
    });
    rows
}

#[tokio::test]
async fn stats_require_admin_role() {
    let server = TestServer::spawn().await;
    let user = server.signup_user("nosy_norm").await;

    let (status, body) = server.get("/api/stats/orders/ordercounter", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        "You are not logged in! Please log in to get access."
    );

    for path in [
        "/api/stats/orders/ordercounter",
        "/api/stats/products/categorystats",
    ] {
        let (status, body) = server.get(path, Some(&user)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} let a user in", path);
        assert_eq!(
            body["message"],
            "You do not have permission to perform this action"
        );
    }
}

#[tokio::test]
async fn empty_tables_produce_empty_reports() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("admin_empty").await;

    // 空表给空数组, 不给 [{total: 0}] 这类占位行
    let (status, body) = server.get("/api/stats/orders/ordercounter", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stats"], json!([]));

    let (_, body) = server.get("/api/stats/orders/total-income", Some(&admin)).await;
    assert_eq!(body["data"]["income"], json!([]));

    let (_, body) = server
        .get("/api/stats/products/categorystats", Some(&admin))
        .await;
    assert_eq!(body["data"]["stats"], json!([]));

    let (_, body) = server
        .get("/api/stats/products/stock-stats", Some(&admin))
        .await;
    assert_eq!(body["data"]["stats"], json!([]));

    let (_, body) = server
        .get("/api/stats/orders/total-income-category", Some(&admin))
        .await;
    assert_eq!(body["result"], 0);
    assert_eq!(body["data"]["income"], json!([]));
}

#[tokio::test]
async fn reports_aggregate_catalog_and_orders() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("stats_admin").await;
    let (ann, ann_id) = server.signup_user_with_id("buyer_ann").await;
    let ben = server.signup_user("buyer_ben").await;

    // ========== 商品种子 ==========
    let mut body = product_body("Galaxy S24", "mobile", 900.0, 50);
    body["ratings_average"] = json!(4.8);
    let galaxy = server.create_product(&admin, body).await;

    let mut body = product_body("Pixel 9", "mobile", 800.0, 40);
    body["ratings_average"] = json!(4.6);
    let pixel = server.create_product(&admin, body).await;

    let mut body = product_body("ThinkPad X1", "laptop", 1500.0, 20);
    body["ratings_average"] = json!(4.9);
    let thinkpad = server.create_product(&admin, body).await;

    // 评分低于 4.5, 不进分类统计
    let mut body = product_body("Dune Sofa", "home", 1200.0, 10);
    body["ratings_average"] = json!(3.9);
    server.create_product(&admin, body).await;

    // 已下架, 不进库存统计
    let mut body = product_body("Hidden Gem", "home", 60.0, 99);
    body["ratings_average"] = json!(4.2);
    body["available"] = json!(false);
    server.create_product(&admin, body).await;

    // ========== 订单种子 ==========
    // ann: 2x Galaxy + 1x ThinkPad = 3300, 3x Pixel = 2400; ben: 1x Pixel = 800
    for (token, lines) in [
        (&ann, json!([order_line(&galaxy, 2), order_line(&thinkpad, 1)])),
        (&ann, json!([order_line(&pixel, 3)])),
        (&ben, json!([order_line(&pixel, 1)])),
    ] {
        let (status, body) = server
            .post(
                "/api/orders",
                Some(token),
                json!({ "products": lines, "shipping_address": "Warehouse Rd 1" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed order failed: {}", body);
    }

    // 高评分商品的分类统计: 分类名大写, 均分保留两位
    let (status, body) = server
        .get("/api/stats/products/categorystats", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        rows_by_category(&body, "stats"),
        vec![
            json!({
                "category": "LAPTOP",
                "num_products": 1,
                "avg_ratings": 4.9,
                "max_price": 1500.0,
                "min_price": 1500.0,
            }),
            json!({
                "category": "MOBILE",
                "num_products": 2,
                "avg_ratings": 4.7,
                "max_price": 900.0,
                "min_price": 800.0,
            }),
        ]
    );

    // 在售商品的库存统计: 下单后的余量, 下架商品不计
    let (_, body) = server
        .get("/api/stats/products/stock-stats", Some(&admin))
        .await;
    assert_eq!(
        rows_by_category(&body, "stats"),
        vec![
            json!({ "category": "HOME", "total_stock": 10 }),
            json!({ "category": "LAPTOP", "total_stock": 19 }),
            json!({ "category": "MOBILE", "total_stock": 84 }),
        ]
    );

    // 订单行按分类计数: 数的是行数不是件数
    let (_, body) = server
        .get("/api/stats/orders/categorystats", Some(&admin))
        .await;
    assert_eq!(
        rows_by_category(&body, "stats"),
        vec![
            json!({ "category": "laptop", "number_of_sold_items": 1 }),
            json!({ "category": "mobile", "number_of_sold_items": 3 }),
        ]
    );

    let (_, body) = server.get("/api/stats/orders/ordercounter", Some(&admin)).await;
    assert_eq!(body["data"]["stats"], json!([{ "total": 3 }]));

    // 每个用户的订单数, 多者在前
    let (_, body) = server.get("/api/stats/orders/user-stats", Some(&admin)).await;
    let stats = body["data"]["stats"].as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(
        stats[0],
        json!({
            "userid": ann_id,
            "username": "buyer_ann",
            "user_email": "buyer_ann@example.com",
            "number_of_orders": 2,
        })
    );
    assert_eq!(stats[1]["username"], "buyer_ben");
    assert_eq!(stats[1]["number_of_orders"], 1);

    // 3300 + 2400 + 800
    let (_, body) = server.get("/api/stats/orders/total-income", Some(&admin)).await;
    assert_eq!(body["data"]["income"][0]["total_sales_amount"], 6500.0);

    // 分类收入 = 单价快照 * 数量: mobile 5000, laptop 1500
    let (_, body) = server
        .get("/api/stats/orders/total-income-category", Some(&admin))
        .await;
    assert_eq!(body["result"], 2);
    assert_eq!(
        rows_by_category(&body, "income"),
        vec![
            json!({ "category": "laptop", "total_income": 1500.0 }),
            json!({ "category": "mobile", "total_income": 5000.0 }),
        ]
    );

    // 畅销榜按件数: Pixel 4, Galaxy 2, ThinkPad 1, 名次确定
    let (_, body) = server
        .get("/api/stats/orders/most-sales-products", Some(&admin))
        .await;
    let stats = body["data"]["stats"].as_array().unwrap();
    assert_eq!(stats.len(), 3);
    assert_eq!(
        stats[0],
        json!({ "product": pixel, "product_name": "Pixel 9", "total_sold": 4 })
    );
    assert_eq!(
        stats[1],
        json!({ "product": galaxy, "product_name": "Galaxy S24", "total_sold": 2 })
    );
    assert_eq!(
        stats[2],
        json!({ "product": thinkpad, "product_name": "ThinkPad X1", "total_sold": 1 })
    );

    // ========== 商品删除后的报表 ==========
    // 被删商品的行在分类/畅销报表里过滤掉, 计数和收入报表不回溯
    let flash = server
        .create_product(&admin, product_body("Flash Sale", "other", 10.0, 5))
        .await;
    let (status, _) = server
        .post(
            "/api/orders",
            Some(&ben),
            json!({ "products": [order_line(&flash, 2)], "shipping_address": "Pop-up Stand" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = server
        .delete(&format!("/api/products/{}", flash), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = server
        .get("/api/stats/orders/categorystats", Some(&admin))
        .await;
    assert_eq!(
        rows_by_category(&body, "stats"),
        vec![
            json!({ "category": "laptop", "number_of_sold_items": 1 }),
            json!({ "category": "mobile", "number_of_sold_items": 3 }),
        ]
    );

    let (_, body) = server
        .get("/api/stats/orders/most-sales-products", Some(&admin))
        .await;
    assert_eq!(body["data"]["stats"].as_array().unwrap().len(), 3);

    let (_, body) = server.get("/api/stats/orders/ordercounter", Some(&admin)).await;
    assert_eq!(body["data"]["stats"], json!([{ "total": 4 }]));

    let (_, body) = server.get("/api/stats/orders/total-income", Some(&admin)).await;
    assert_eq!(body["data"]["income"][0]["total_sales_amount"], 6520.0);
}
