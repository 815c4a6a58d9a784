//! 订单 WebSocket 端点：单租户实时订单事件
//!
//! GET /api/orders/ws?token=<JWT>
//! Auth: JWT 通过 query parameter 传递（浏览器 WebSocket 不支持自定义 headers）
//!
//! Server → Client 帧均为 JSON:
//! - `OrderEvent`（`order_created` / `order_updated`），提交后发布
//! - `{"type":"resync"}`：连接落后时发送，客户端重新拉取 `GET /api/orders`。
//!   丢失的事件不会重放。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Duration;

use crate::auth::tenant_auth;
use crate::state::AppState;

/// 每个租户的订单 WS 最大并发连接数
const MAX_WS_PER_TENANT: usize = 50;
const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

#[derive(Serialize)]
struct ResyncHint {
    #[serde(rename = "type")]
    kind: &'static str,
    missed: u64,
}

/// 租户连接计数中占用的一个名额
///
/// drop 时释放，握手没走到 session 也会归还名额。计数归零后移除租户条目。
struct ConnectionSlot {
    connections: Arc<DashMap<String, AtomicUsize>>,
    tenant_id: String,
}

impl ConnectionSlot {
    /// 占用一个名额；租户已满 `max` 时返回当前计数
    fn acquire(
        connections: &Arc<DashMap<String, AtomicUsize>>,
        tenant_id: &str,
        max: usize,
    ) -> Result<Self, usize> {
        let counter = connections
            .entry(tenant_id.to_string())
            .or_insert_with(|| AtomicUsize::new(0));
        let prev = counter.fetch_add(1, Ordering::SeqCst);
        if prev >= max {
            counter.fetch_sub(1, Ordering::SeqCst);
            return Err(prev);
        }
        Ok(Self {
            connections: connections.clone(),
            tenant_id: tenant_id.to_string(),
        })
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        if let Some(counter) = self.connections.get(&self.tenant_id) {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
        self.connections
            .remove_if(&self.tenant_id, |_, c| c.load(Ordering::SeqCst) == 0);
    }
}

/// GET /api/orders/ws?token=<JWT>
pub async fn handle_orders_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let ctx = tenant_auth::verify_token(&query.token, &state.jwt_secret)?;
    let tenant_id = ctx.tenant_id;

    let slot = ConnectionSlot::acquire(&state.ws_connections, &tenant_id, MAX_WS_PER_TENANT)
        .map_err(|count| {
            AppError::with_message(
                ErrorCode::ResourceLimitExceeded,
                format!("Too many order connections ({count}/{MAX_WS_PER_TENANT})"),
            )
        })?;

    Ok(ws.on_upgrade(move |socket| orders_ws_session(socket, state, tenant_id, slot)))
}

async fn orders_ws_session(
    socket: WebSocket,
    state: AppState,
    tenant_id: String,
    slot: ConnectionSlot,
) {
    let (mut sink, mut stream) = socket.split();
    let mut sub = state.hub.subscribe(&tenant_id);

    tracing::info!(tenant_id = %tenant_id, "Order WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // 跳过立即触发的第一次

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = sub.recv() => {
                let sent = match event {
                    Ok(event) => send_json(&mut sink, &event).await,
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(tenant_id = %tenant_id, lagged = n, "Order subscriber lagged, requesting resync");
                        send_json(&mut sink, &ResyncHint { kind: "resync", missed: n }).await
                    }
                    Err(RecvError::Closed) => break,
                };
                if sent.is_err() {
                    break;
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // 客户端帧不携带命令
                    _ => {}
                }
            }
        }
    }

    drop(sub);
    state.hub.prune(&tenant_id);
    drop(slot);

    tracing::info!(tenant_id = %tenant_id, "Order WS disconnected");
}

async fn send_json<S, T>(sink: &mut S, msg: &T) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
