//! OrderStore：事务编排，先提交后通知
//!
//! 所有写操作走同一条路径：
//!
//! ```text
//! payload ─► OrderDraft (validate, totals) ─► repository transaction ─► commit
//!                                                                        │
//!                                       ChangeNotifier::publish ◄────────┘
//! ```
//!
//! 未提交的写入不发布任何事件。每次写入尝试和它的通知在同一个 spawn 出来的
//! task 中执行：请求 future 被 drop 不会中断已开始的尝试，提交之后一定会发出事件。
//! 两次尝试之间的退避 sleep 留在请求内，随请求一起取消。

use std::future::Future;
use std::sync::Arc;

use shared::order::{Order, OrderEvent, OrderPayload, OrderTab};

use super::clock::Clock;
use super::error::{OrderError, OrderResult};
use super::lifecycle::{self, OrderDraft};
use super::operational_day::derive_operational_day;
use super::retry::RetryPolicy;
use crate::db::{ListQuery, NewOrder, OrderRepository};
use crate::live::ChangeNotifier;

/// 列表默认每页条数
pub const DEFAULT_PER_PAGE: i64 = 50;
/// 列表每页条数上限
pub const MAX_PER_PAGE: i64 = 200;

#[derive(Clone)]
pub struct OrderStore {
    repo: Arc<dyn OrderRepository>,
    notifier: Arc<dyn ChangeNotifier>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl OrderStore {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        notifier: Arc<dyn ChangeNotifier>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repo,
            notifier,
            clock,
            retry,
        }
    }

    /// 校验、编号并持久化新订单，然后通知
    ///
    /// 营业日在第一次尝试前推导一次。分区竞争失败时从事务开头重试。
    pub async fn create_order(&self, tenant_id: &str, payload: &OrderPayload) -> OrderResult<Order> {
        let draft = OrderDraft::from_payload(payload)?;
        let status = draft.initial_status()?;
        let now = self.clock.now();
        let order_day = derive_operational_day(draft.kind, draft.scheduled_at, now);

        let new = NewOrder {
            tenant_id: tenant_id.to_string(),
            order_day,
            status,
            draft,
            now,
        };

        let mut attempt = 0;
        let order = loop {
            attempt += 1;
            let repo = self.repo.clone();
            let attempt_new = new.clone();
            let write = async move { repo.insert(&attempt_new).await };
            match self.commit_then_publish(tenant_id, write, OrderEvent::created).await {
                Ok(order) => break order,
                Err(OrderError::SequenceConflict) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::debug!(
                        tenant_id,
                        %order_day,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Daily sequence conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(OrderError::SequenceConflict) => {
                    tracing::warn!(tenant_id, %order_day, attempt, "Daily sequence contention exceeded");
                    return Err(OrderError::ContentionExceeded { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        };

        tracing::info!(
            tenant_id,
            order_id = order.id,
            order_no = %order.order_no,
            order_day = %order.order_day,
            order_seq = order.order_seq,
            attempt,
            "Order created"
        );
        Ok(order)
    }

    /// 替换订单的可变字段，然后通知
    ///
    /// `order_seq` 和 `order_day` 只写一次：修改 `orderType` 或 `scheduledAt`
    /// 不会把订单移到其他分区。
    pub async fn update_order(
        &self,
        tenant_id: &str,
        id: i64,
        payload: &OrderPayload,
    ) -> OrderResult<Order> {
        let draft = OrderDraft::from_payload(payload)?;
        let repo = self.repo.clone();
        let tenant = tenant_id.to_string();
        let now = self.clock.now();
        let write = async move { repo.update(&tenant, id, &draft, now).await };
        let order = self
            .commit_then_publish(tenant_id, write, OrderEvent::updated)
            .await?;

        tracing::info!(tenant_id, order_id = id, status = %order.status, "Order updated");
        Ok(order)
    }

    /// 变更订单状态，然后通知
    pub async fn transition_status(&self, tenant_id: &str, id: i64, raw: &str) -> OrderResult<Order> {
        let status = lifecycle::parse_status(raw.trim().to_string())?;
        let repo = self.repo.clone();
        let tenant = tenant_id.to_string();
        let now = self.clock.now();
        let write = async move { repo.update_status(&tenant, id, status, now).await };
        let order = self
            .commit_then_publish(tenant_id, write, OrderEvent::updated)
            .await?;

        tracing::info!(tenant_id, order_id = id, %status, "Order status changed");
        Ok(order)
    }

    /// 在独立 task 中执行一次仓储写入，成功后发布事件
    ///
    /// task 不依赖调用方存活：spawn 之后要么提交要么回滚，提交后一定发布，
    /// 不管是否还有人在 await handle。
    async fn commit_then_publish<W>(
        &self,
        tenant_id: &str,
        write: W,
        event: fn(Order) -> OrderEvent,
    ) -> OrderResult<Order>
    where
        W: Future<Output = OrderResult<Order>> + Send + 'static,
    {
        let notifier = self.notifier.clone();
        let tenant = tenant_id.to_string();
        let task = tokio::spawn(async move {
            let order = write.await?;
            notifier.publish(&tenant, event(order.clone()));
            Ok::<_, OrderError>(order)
        });

        task.await.map_err(|e| {
            tracing::error!(tenant_id, error = %e, "Order write task failed");
            OrderError::persistence(format!("order write task failed: {e}"))
        })?
    }

    pub async fn get_order(&self, tenant_id: &str, id: i64) -> OrderResult<Order> {
        self.repo
            .find(tenant_id, id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// 分页查询租户订单，最新的在前
    ///
    /// `page` 从 1 开始，`per_page` 限制在 `1..=MAX_PER_PAGE`。
    pub async fn list_orders(
        &self,
        tenant_id: &str,
        tab: OrderTab,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> OrderResult<Vec<Order>> {
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let page = page.unwrap_or(1).max(1);
        let query = ListQuery {
            kind: tab.kind(),
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        };
        self.repo.list(tenant_id, &query).await
    }
}
