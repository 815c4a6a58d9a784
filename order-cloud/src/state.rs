//! order-cloud 应用状态

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use dashmap::DashMap;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::db::{MemoryOrderRepository, OrderRepository, PgOrderRepository};
use crate::live::OrderHub;
use crate::orders::{OrderStore, RetryPolicy, SystemClock};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    /// 订单编号与生命周期核心
    pub store: OrderStore,
    /// 按租户隔离的通知 hub（同时注入 `store`）
    pub hub: OrderHub,
    /// 租户认证用的 JWT secret
    pub jwt_secret: String,
    /// 每个租户当前的 WebSocket 连接数
    pub ws_connections: Arc<DashMap<String, AtomicUsize>>,
}

impl AppState {
    /// 创建 AppState
    ///
    /// 设置了 `DATABASE_URL` 时连接 PostgreSQL 并执行迁移，否则退回内存仓储。
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let repo: Arc<dyn OrderRepository> = match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!(
                    max_connections = config.db_max_connections,
                    "PostgreSQL order repository ready"
                );
                Arc::new(PgOrderRepository::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, orders are kept in memory");
                Arc::new(MemoryOrderRepository::new())
            }
        };

        Ok(Self::with_repository(
            repo,
            OrderHub::new(config.notify_channel_capacity),
            config.retry.clone(),
            config.jwt_secret.clone(),
        ))
    }

    /// 基于已有仓储组装 store 和 hub
    pub fn with_repository(
        repo: Arc<dyn OrderRepository>,
        hub: OrderHub,
        retry: RetryPolicy,
        jwt_secret: String,
    ) -> Self {
        let store = OrderStore::new(repo, Arc::new(hub.clone()), Arc::new(SystemClock), retry);
        Self {
            store,
            hub,
            jwt_secret,
            ws_connections: Arc::new(DashMap::new()),
        }
    }
}
