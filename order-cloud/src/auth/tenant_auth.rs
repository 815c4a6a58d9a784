//! 订单 API 的租户 JWT 认证

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// 租户员工的 JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct TenantClaims {
    /// 用户 ID
    pub sub: String,
    /// 租户（公司）ID
    pub company_id: String,
    /// 员工角色
    #[serde(default)]
    pub role: String,
    /// 过期时间（Unix 时间戳，秒）
    pub exp: usize,
    /// 签发时间（Unix 时间戳，秒）
    pub iat: usize,
}

/// 订单操作的调用方
///
/// 由 [`tenant_auth_middleware`] 写入 request extensions。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: String,
    pub user_id: String,
    pub role: String,
}

impl From<TenantClaims> for TenantContext {
    fn from(claims: TenantClaims) -> Self {
        Self {
            tenant_id: claims.company_id,
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// 为租户用户签发 JWT
pub fn create_token(
    tenant_id: &str,
    user_id: &str,
    role: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = TenantClaims {
        sub: user_id.to_string(),
        company_id: tenant_id.to_string(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// 验证 token 并解析出租户上下文
pub fn verify_token(token: &str, secret: &str) -> Result<TenantContext, AppError> {
    let token_data = jsonwebtoken::decode::<TenantClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    if token_data.claims.company_id.trim().is_empty() {
        return Err(AppError::new(ErrorCode::TenantNotSelected));
    }
    Ok(token_data.claims.into())
}

/// 从 Authorization header 提取并验证租户 JWT 的中间件
pub async fn tenant_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format").into_response())?;

    let context = verify_token(token, &state.jwt_secret).map_err(IntoResponse::into_response)?;
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
