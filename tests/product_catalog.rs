//! 商品目录的查询、筛选和管理端点

mod common;

use common::{TestServer, product_body};
use http::StatusCode;
use rand::seq::SliceRandom;
use serde_json::json;

#[tokio::test]
async fn catalog_is_public_and_management_is_admin_only() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("admin_amy").await;
    let user = server.signup_user("plain_pete").await;

    // 管理员建品
    let (status, body) = server
        .post(
            "/api/products",
            Some(&admin),
            product_body("Galaxy S24", "mobile", 899.99, 10),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    assert_eq!(body["message"], "Product created successfully");
    let id = body["data"]["product"]["id"].as_str().unwrap().to_string();

    // 游客直接读目录
    let (status, body) = server.get(&format!("/api/products/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["product"]["name"], "Galaxy S24");
    assert_eq!(body["data"]["product"]["price"], 899.99);
    assert_eq!(body["data"]["product"]["category"], "mobile");

    // 普通用户不得建品
    let (status, body) = server
        .post(
            "/api/products",
            Some(&user),
            product_body("Pixel 9", "mobile", 799.0, 5),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You do not have permission to perform this action"
    );

    // 游客写目录在认证门就被拦下 (只有 GET 在白名单)
    let (status, _) = server
        .post(
            "/api/products",
            None,
            product_body("Pixel 9", "mobile", 799.0, 5),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_supports_filter_sort_project_paginate() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("admin_filter").await;

    // 12 件商品, 价格 10..=120; 打乱写入顺序, 排序不能靠插入序
    let mut seeds: Vec<i64> = (1..=12).collect();
    seeds.shuffle(&mut rand::thread_rng());
    for i in seeds {
        server
            .create_product(
                &admin,
                product_body(&format!("Widget {:02}", i), "home", (i as f64) * 10.0, 5),
            )
            .await;
    }

    // 默认分页 10 条
    let (status, body) = server.get("/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 10);
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 10);

    // 第二页 5 条, 价格升序 -> 60..=100
    let (status, body) = server
        .get("/api/products?sort=price&page=2&limit=5", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 5);
    let prices: Vec<f64> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![60.0, 70.0, 80.0, 90.0, 100.0]);

    // 区间过滤 (方括号按 RFC 3986 转义: price[gte] / price[lte])
    let (status, body) = server
        .get("/api/products?price%5Bgte%5D=95&price%5Blte%5D=115", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut prices: Vec<f64> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect();
    prices.sort_by(f64::total_cmp);
    assert_eq!(prices, vec![100.0, 110.0]);

    // 投影只返回点名的字段, id 总是带上
    let (status, body) = server
        .get("/api/products?fields=name,price&limit=3", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let first = body["data"]["products"][0].as_object().unwrap();
    let mut keys: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["id", "name", "price"]);

    // 超出范围的页码返回空列表而不是错误
    let (status, body) = server.get("/api/products?page=99&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 0);
    assert_eq!(body["data"]["products"], json!([]));

    // 非法分页参数静默回退默认值
    let (status, body) = server.get("/api/products?page=abc&limit=-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 10);
}

#[tokio::test]
async fn alias_routes_return_trimmed_projections() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("admin_alias").await;

    for (name, category, price, rating, stock) in [
        ("Galaxy S24", "mobile", 899.99, 4.8, 10),
        ("Pixel 9", "mobile", 799.0, 4.6, 8),
        ("Xperia 5", "mobile", 699.0, 4.2, 3),
        ("Moto G", "mobile", 199.0, 4.0, 30),
        ("iPhone 16", "mobile", 1099.0, 4.9, 7),
        ("OnePlus 13", "mobile", 649.0, 4.4, 9),
        ("Dune Sofa", "home", 1299.0, 4.9, 2),
        ("Oak Table", "home", 499.0, 4.7, 4),
    ] {
        let mut body = product_body(name, category, price, stock);
        body["ratings_average"] = json!(rating);
        server.create_product(&admin, body).await;
    }

    // top-5-best: 全品类取评分最高的 5 件
    let (status, body) = server.get("/api/products/top-5-best", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 5);
    let products = body["data"]["products"].as_array().unwrap();
    let mut ratings: Vec<f64> = products
        .iter()
        .map(|p| p["ratings_average"].as_f64().unwrap())
        .collect();
    ratings.sort_by(f64::total_cmp);
    assert_eq!(ratings, vec![4.6, 4.7, 4.8, 4.9, 4.9]);

    // 别名路由的投影是固定的字段表
    let mut keys: Vec<&str> = products[0]
        .as_object()
        .unwrap()
        .keys()
        .map(|k| k.as_str())
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["category", "id", "name", "price", "ratings_average", "stock"]
    );

    // top-5-Cheapest-mobile: 只看 mobile, 价格最低的 5 件 (家具不算)
    let (status, body) = server
        .get("/api/products/top-5-Cheapest-mobile", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], 5);
    let mut prices: Vec<f64> = body["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect();
    prices.sort_by(f64::total_cmp);
    assert_eq!(prices, vec![199.0, 649.0, 699.0, 799.0, 899.99]);

    // 别名大小写必须完全一致, 其他拼法落进按 id 查找 -> 404
    let (status, body) = server
        .get("/api/products/top-5-cheapest-mobile", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No product found with that ID");
}

#[tokio::test]
async fn create_normalizes_and_rejects_duplicates() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("admin_dup").await;

    // 名称两侧空白在入库前裁掉
    let (status, body) = server
        .post(
            "/api/products",
            Some(&admin),
            product_body("  Spaced Out  ", "other", 12.0, 1),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["product"]["name"], "Spaced Out");

    // 裁剪后的重名同样被拒
    let (status, body) = server
        .post(
            "/api/products",
            Some(&admin),
            product_body("Spaced Out", "other", 15.0, 2),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Product 'Spaced Out' already exists");

    // 校验失败
    let (status, body) = server
        .post(
            "/api/products",
            Some(&admin),
            product_body("X", "other", 9.0, 1),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Product name must be between 2 and 70 characters"
    );

    let (status, body) = server
        .post(
            "/api/products",
            Some(&admin),
            product_body("Negative Price", "other", -1.0, 1),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Price must not be negative");
}

#[tokio::test]
async fn update_and_delete_products() {
    let server = TestServer::spawn().await;
    let admin = server.signup_admin("admin_upd").await;
    let id = server
        .create_product(&admin, product_body("Old Lamp", "home", 25.0, 3))
        .await;

    // PATCH 局部更新, 未提及的字段不动
    let (status, body) = server
        .patch(
            &format!("/api/products/{}", id),
            Some(&admin),
            json!({ "price": 19.5, "stock": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", body);
    assert_eq!(body["message"], "Product updated successfully");
    assert_eq!(body["data"]["product"]["price"], 19.5);
    assert_eq!(body["data"]["product"]["stock"], 7);
    assert_eq!(body["data"]["product"]["name"], "Old Lamp");

    // 评分字段不开放修改
    let (status, body) = server
        .patch(
            &format!("/api/products/{}", id),
            Some(&admin),
            json!({ "ratings_average": 5.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"].as_str().unwrap().contains("unknown field"),
        "unexpected message: {}",
        body["message"]
    );

    // 改名撞上已有商品
    server
        .create_product(&admin, product_body("New Lamp", "home", 30.0, 2))
        .await;
    let (status, body) = server
        .patch(
            &format!("/api/products/{}", id),
            Some(&admin),
            json!({ "name": "New Lamp" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Product 'New Lamp' already exists");

    // 删除后目录查不到
    let (status, body) = server
        .delete(&format!("/api/products/{}", id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = server.get(&format!("/api/products/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No product found with that ID");

    // 不存在的 id 与畸形 id 都按 404 处理
    let (status, body) = server
        .patch(
            "/api/products/product:zzzzzzzz",
            Some(&admin),
            json!({ "price": 1.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No product found with ID product:zzzzzzzz");

    let (status, _) = server.get("/api/products/garbage-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
