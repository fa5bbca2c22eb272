//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppError;
use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::db::repository::UserRepository;
use crate::security_log;

const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT, 再按令牌里的
/// 用户 ID 查询数据库确认用户仍然存在且密码未在签发后修改。
/// 通过后将 [`CurrentUser`] 注入请求扩展 (`req.extensions_mut().insert(user)`),
/// 其中的角色取自数据库而非令牌, 角色变更无需重新登录即可生效。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径 (如 `/health`)
/// - `POST /api/users/signup` / `POST /api/users/login`
/// - `GET /api/products...` (公开商品目录)
///
/// # 错误处理
///
/// | 情况 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 InvalidToken |
/// | 用户已被删除 | 401 Unauthorized |
/// | 签发后修改过密码 | 401 Unauthorized |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // 公共 API 路由跳过认证
    let is_public_api_route = path == "/api/users/signup"
        || path == "/api/users/login"
        || (req.method() == http::Method::GET
            && (path == "/api/products" || path.starts_with("/api/products/")));
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(JwtService::extract_from_header) {
        Some(token) => token,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::unauthorized(NOT_LOGGED_IN));
        }
    };

    // 验证令牌
    let claims = match jwt_service.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            return Err(e.into());
        }
    };

    // 确认令牌对应的用户仍然存在
    let repo = UserRepository::new(state.get_db());
    let user = match repo.find_by_id(&claims.sub).await? {
        Some(user) => user,
        None => {
            security_log!("WARN", "auth_user_gone", sub = claims.sub.clone());
            return Err(AppError::unauthorized(
                "The user belonging to this token no longer exists.",
            ));
        }
    };

    // 签发之后改过密码的令牌一律作废
    if user.changed_password_after(claims.iat) {
        security_log!(
            "WARN",
            "auth_stale_token",
            user_id = claims.sub.clone(),
            username = user.username.clone()
        );
        return Err(AppError::unauthorized(
            "User recently changed password! Please log in again.",
        ));
    }

    req.extensions_mut().insert(CurrentUser::from(&user));
    Ok(next.run(req).await)
}

/// 角色检查中间件 - 要求指定角色之一
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/stats/orders/total-income", get(handler::total_income))
///     .layer(middleware::from_fn(require_role(&["admin"])));
/// ```
///
/// # 错误
///
/// 角色不符返回 403 Forbidden
pub fn require_role(
    roles: &'static [&'static str],
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or_else(|| AppError::unauthorized(NOT_LOGGED_IN))?;

            if !roles.contains(&user.role.as_str()) {
                security_log!(
                    "WARN",
                    "role_denied",
                    user_id = user.id.clone(),
                    username = user.username.clone(),
                    required_roles = roles.join(",")
                );
                return Err(AppError::forbidden(
                    "You do not have permission to perform this action",
                ));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 管理员中间件 - 要求管理员角色
///
/// 检查 `CurrentUser::is_admin()`
///
/// # 错误
///
/// 非管理员返回 403 Forbidden
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::unauthorized(NOT_LOGGED_IN))?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.clone(),
            username = user.username.clone(),
            user_role = user.role.as_str()
        );
        return Err(AppError::forbidden(
            "You do not have permission to perform this action",
        ));
    }

    Ok(next.run(req).await)
}
