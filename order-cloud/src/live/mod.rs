//! OrderHub：按租户分发已提交的订单事件
//!
//! ```text
//! OrderStore（提交后）
//!       │ OrderEvent
//!       ▼
//! OrderHub
//!   ├── tenants: tenant_id → broadcast::Sender<OrderEvent>
//!   ├── global:  broadcast::Sender<OrderEvent>（不带租户的事件，所有订阅者）
//!   │     │
//!   │     ▼
//!   └── WS handler (subscribe → recv → push)
//! ```
//!
//! 尽力投递：发布从不阻塞，也不会让调用方失败。
//! 落后超过 channel 容量的订阅者收到 `RecvError::Lagged`，需要重新读取快照。

use dashmap::DashMap;
use shared::order::OrderEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// hub 的发布端（订单 store 使用）
pub trait ChangeNotifier: Send + Sync {
    /// 投递给 `tenant_id` 下当前所有订阅者
    fn publish(&self, tenant_id: &str, event: OrderEvent);

    /// 投递给所有租户的所有订阅者
    fn broadcast(&self, event: OrderEvent);
}

/// 每个 channel 的默认缓冲
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// 进程级订单 hub，按租户严格隔离
#[derive(Clone)]
pub struct OrderHub {
    tenants: Arc<DashMap<String, broadcast::Sender<OrderEvent>>>,
    global: broadcast::Sender<OrderEvent>,
    capacity: usize,
}

impl Default for OrderHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl OrderHub {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (global, _) = broadcast::channel(capacity);
        Self {
            tenants: Arc::new(DashMap::new()),
            global,
            capacity,
        }
    }

    /// 为某个租户注册订阅者（同时接收不带租户的事件）
    pub fn subscribe(&self, tenant_id: &str) -> OrderSubscription {
        let tenant = self
            .tenants
            .entry(tenant_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        OrderSubscription {
            tenant,
            global: self.global.subscribe(),
        }
    }

    /// 租户当前订阅者数量
    pub fn subscriber_count(&self, tenant_id: &str) -> usize {
        self.tenants
            .get(tenant_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// 已注册 channel 的租户数
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    /// 最后一个订阅者离开后移除租户 channel
    pub fn prune(&self, tenant_id: &str) {
        self.tenants
            .remove_if(tenant_id, |_, tx| tx.receiver_count() == 0);
    }
}

impl ChangeNotifier for OrderHub {
    fn publish(&self, tenant_id: &str, event: OrderEvent) {
        let Some(tx) = self.tenants.get(tenant_id).map(|tx| tx.clone()) else {
            tracing::trace!(tenant_id, event_type = %event.event_type, "No subscribers");
            return;
        };
        // 只有所有 receiver 都已关闭时 send 才会失败
        if tx.send(event).is_err() {
            self.prune(tenant_id);
        }
    }

    fn broadcast(&self, event: OrderEvent) {
        let _ = self.global.send(event);
    }
}

/// 单个连接的接收端
pub struct OrderSubscription {
    tenant: broadcast::Receiver<OrderEvent>,
    global: broadcast::Receiver<OrderEvent>,
}

impl OrderSubscription {
    /// 从租户 channel 或全局 channel 取下一个事件
    ///
    /// 两个 channel 都关闭时才返回 `Closed`。
    pub async fn recv(&mut self) -> Result<OrderEvent, RecvError> {
        let (res, from_tenant) = tokio::select! {
            res = self.tenant.recv() => (res, true),
            res = self.global.recv() => (res, false),
        };
        match res {
            Err(RecvError::Closed) if from_tenant => self.global.recv().await,
            Err(RecvError::Closed) => self.tenant.recv().await,
            other => other,
        }
    }
}
