//! order-cloud API 路由

pub mod health;
pub mod orders;
pub mod orders_ws;

use crate::auth::tenant_auth_middleware;
use crate::state::AppState;
use axum::routing::{get, patch};
use axum::{Json, Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// 创建完整路由
pub fn create_router(state: AppState) -> Router {
    // 租户订单 API（JWT 认证）
    let orders = Router::new()
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/api/orders/{id}",
            get(orders::get_order).put(orders::update_order),
        )
        .route("/api/orders/{id}/status", patch(orders::update_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_auth_middleware,
        ));

    // WebSocket 通过 query string 认证
    let ws = Router::new().route("/api/orders/ws", get(orders_ws::handle_orders_ws));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(orders)
        .merge(ws)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
