//! User API Handlers
//!
//! Handles signup, login, and the admin user listing

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{LoginRequest, SignupRequest, User, UserResponse};
use crate::db::repository::UserRepository;
use crate::utils::{ApiResponse, AppError, AppJson, AppResult, ok_with_result};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// 签发令牌并组装认证响应
///
/// 响应体携带 token, 同时写入 `jwt` Cookie (HttpOnly, 生产环境附加 Secure)。
fn send_token(
    state: &ServerState,
    user: &User,
    status: StatusCode,
    message: &str,
) -> AppResult<Response> {
    let jwt_service = state.get_jwt_service();
    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    let token = jwt_service.generate_token(&user_id, &user.username, user.role.as_str())?;

    let mut cookie = format!(
        "jwt={}; Path=/; HttpOnly; Max-Age={}",
        token,
        jwt_service.cookie_max_age_seconds()
    );
    if state.config.is_production() {
        cookie.push_str("; Secure");
    }

    let body = ApiResponse {
        token: Some(token),
        message: Some(message.to_string()),
        ..ApiResponse::with_data(json!({ "user": UserResponse::from(user.clone()) }))
    };

    let mut response = (status, Json(body)).into_response();
    let cookie_value = http::HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::internal(format!("Failed to build cookie header: {}", e)))?;
    response
        .headers_mut()
        .insert(http::header::SET_COOKIE, cookie_value);
    Ok(response)
}

/// POST /api/users/signup - 注册新用户
///
/// 只接受 name/username/email/password/password_confirm,
/// 多余字段直接被反序列化拒绝, 角色固定为 user。
pub async fn signup(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> AppResult<Response> {
    payload.validate()?;

    let repo = UserRepository::new(state.get_db());
    let user = repo.create(payload).await?;

    tracing::info!(
        user_id = %user.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
        username = %user.username,
        "New user registered"
    );

    send_token(&state, &user, StatusCode::CREATED, "Your account has been created!")
}

/// POST /api/users/login - 登录
///
/// 用户名或邮箱二者其一即可。查无此人和密码错误返回同一条 401,
/// 并带固定延迟, 防止时序攻击和用户名枚举。
pub async fn login(
    State(state): State<ServerState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Response> {
    let password = match payload.password.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => return Err(AppError::validation("Please provide your password")),
    };
    if payload.username.is_none() && payload.email.is_none() {
        return Err(AppError::validation("Please provide your username or email"));
    }

    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_login(payload.username.as_deref(), payload.email.as_deref())
        .await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Check authentication result - unified error message to prevent username enumeration
    let user = match user {
        Some(user) => {
            let password_valid = user
                .verify_password(password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                tracing::warn!(username = %user.username, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            user
        }
        None => {
            tracing::warn!("Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    tracing::info!(
        user_id = %user.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
        username = %user.username,
        "User logged in successfully"
    );

    send_token(&state, &user, StatusCode::OK, "Logged in successfully")
}

/// GET /api/users - 获取所有用户 (管理员)
pub async fn list(State(state): State<ServerState>) -> AppResult<Response> {
    let repo = UserRepository::new(state.get_db());
    let users: Vec<UserResponse> = repo
        .find_all()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(ok_with_result(users.len(), json!({ "users": users })))
}
