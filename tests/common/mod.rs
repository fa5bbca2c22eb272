//! 集成测试共享工具
//!
//! 在临时工作目录上初始化完整的 ServerState, 通过 HttpService::oneshot
//! 在进程内驱动路由, 不监听 TCP 端口, 各测试之间互不干扰。

#![allow(dead_code)] // 每个测试二进制只用到部分辅助函数

use axum::body::Body;
use bazaar_server::auth::JwtConfig;
use bazaar_server::{Config, JwtService, ServerState};
use http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;

/// 固定测试密钥, 方便测试自行铸造同源令牌
pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-0123456789";

pub struct TestServer {
    pub state: ServerState,
    /// Keeps the work dir alive as long as the server
    _work_dir: TempDir,
}

impl TestServer {
    /// Boot a fresh server backed by an empty temp database
    pub async fn spawn() -> Self {
        let work_dir = tempfile::tempdir().expect("Failed to create temp work dir");

        let mut config = Config::with_overrides(work_dir.path().to_string_lossy(), 0);
        config.environment = "test".to_string();
        config.jwt = JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiration_minutes: 60,
            issuer: "bazaar-server".to_string(),
            audience: "bazaar-api".to_string(),
        };

        let state = ServerState::initialize(&config).await;

        Self {
            state,
            _work_dir: work_dir,
        }
    }

    /// 同密钥不同有效期的 JwtService, 用于铸造过期令牌
    pub fn jwt_with_expiration(&self, expiration_minutes: i64) -> JwtService {
        let mut config = self.state.jwt_service.config.clone();
        config.expiration_minutes = expiration_minutes;
        JwtService::with_config(config)
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> http::Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("Failed to build request"),
            None => builder.body(Body::empty()).expect("Failed to build request"),
        };

        self.state
            .http
            .oneshot(request)
            .await
            .expect("Oneshot request failed")
    }

    /// Run a request and decode the JSON envelope (Null for empty bodies)
    pub async fn request_json(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, path, token, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!(
                    "Response body is not JSON ({}): {}",
                    e,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };
        (status, json)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request_json("GET", path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request_json("POST", path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request_json("PATCH", path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request_json("DELETE", path, token, None).await
    }

    // ========== 数据准备 ==========

    /// Sign up a user through the API, return their token
    pub async fn signup_user(&self, username: &str) -> String {
        self.signup_user_with_id(username).await.0
    }

    /// Sign up and return (token, "user:xyz")
    pub async fn signup_user_with_id(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .post("/api/users/signup", None, signup_body(username))
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        let token = body["token"]
            .as_str()
            .expect("signup response carries no token")
            .to_string();
        let id = body["data"]["user"]["id"]
            .as_str()
            .expect("signup response carries no user id")
            .to_string();
        (token, id)
    }

    /// 直接改库提升角色; 中间件每个请求都重读用户, 旧令牌立即生效
    pub async fn promote_to_admin(&self, username: &str) {
        self.state
            .db
            .query("UPDATE user SET role = 'admin' WHERE username = $username")
            .bind(("username", username.to_string()))
            .await
            .expect("Failed to promote user")
            .check()
            .expect("Failed to promote user");
    }

    /// Sign up + promote, return a token with admin rights
    pub async fn signup_admin(&self, username: &str) -> String {
        let token = self.signup_user(username).await;
        self.promote_to_admin(username).await;
        token
    }

    /// Create a product through the API, return its "product:xyz" id
    pub async fn create_product(&self, admin_token: &str, body: Value) -> String {
        let (status, response) = self.post("/api/products", Some(admin_token), body).await;
        assert_eq!(
            status,
            StatusCode::CREATED,
            "product create failed: {}",
            response
        );
        response["data"]["product"]["id"]
            .as_str()
            .expect("created product carries no id")
            .to_string()
    }

    /// Current stock as the public catalog reports it
    pub async fn product_stock(&self, product_id: &str) -> i64 {
        let (status, body) = self
            .get(&format!("/api/products/{}", product_id), None)
            .await;
        assert_eq!(status, StatusCode::OK, "product lookup failed: {}", body);
        body["data"]["product"]["stock"]
            .as_i64()
            .expect("product carries no stock")
    }
}

/// Standard signup payload; email is derived from the username
pub fn signup_body(username: &str) -> Value {
    json!({
        "name": username,
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "correct-horse",
        "password_confirm": "correct-horse",
    })
}

/// Minimal valid product payload
pub fn product_body(name: &str, category: &str, price: f64, stock: i64) -> Value {
    json!({
        "name": name,
        "category": category,
        "price": price,
        "available": true,
        "stock": stock,
    })
}

/// One order line as the client sends it
pub fn order_line(product_id: &str, quantity: i64) -> Value {
    json!({ "product": product_id, "quantity": quantity })
}
