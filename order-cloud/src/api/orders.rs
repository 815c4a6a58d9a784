//! 订单端点：列表、详情、创建、更新、状态变更

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::order::{Order, OrderPayload, OrderTab, StatusPayload};

use crate::auth::TenantContext;
use crate::state::AppState;

use super::ApiResult;

/// `{ ok: true, item }`
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub ok: bool,
    pub item: Order,
}

impl ItemResponse {
    fn new(item: Order) -> Self {
        Self { ok: true, item }
    }
}

/// `{ ok: true, items }`
#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub ok: bool,
    pub items: Vec<Order>,
}

/// `{ ok: true }`
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// GET /api/orders?tab=&page=&per_page=
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub tab: OrderTab,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<ItemsResponse> {
    let items = state
        .store
        .list_orders(&ctx.tenant_id, query.tab, query.page, query.per_page)
        .await?;
    Ok(Json(ItemsResponse { ok: true, items }))
}

/// GET /api/orders/{id}
///
/// 直接返回订单 DTO，不包 `{ ok, item }`。
pub async fn get_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.store.get_order(&ctx.tenant_id, id).await?;
    Ok(Json(order))
}

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<ItemResponse> {
    let order = state.store.create_order(&ctx.tenant_id, &payload).await?;
    tracing::debug!(user_id = %ctx.user_id, order_id = order.id, "Order created via API");
    Ok(Json(ItemResponse::new(order)))
}

/// PUT /api/orders/{id}
pub async fn update_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderPayload>,
) -> ApiResult<ItemResponse> {
    let order = state
        .store
        .update_order(&ctx.tenant_id, id, &payload)
        .await?;
    Ok(Json(ItemResponse::new(order)))
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> ApiResult<OkResponse> {
    state
        .store
        .transition_status(&ctx.tenant_id, id, &payload.status)
        .await?;
    Ok(Json(OkResponse { ok: true }))
}
