//! 数据访问层
//!
//! [`OrderRepository`] 是订单 store 的事务边界，两种实现：
//! 1. [`PgOrderRepository`]: PostgreSQL，计数器表和订单插入在同一事务
//! 2. [`MemoryOrderRepository`]: 同一契约，用 mutex 实现（开发、测试）

pub mod memory;
pub mod orders;
pub mod sequence;

pub use memory::MemoryOrderRepository;
pub use orders::PgOrderRepository;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::order::{Order, OrderKind, OrderStatus};

use crate::orders::{OrderDraft, OrderResult};

/// 待插入的订单，`order_seq` 由仓储分配
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tenant_id: String,
    /// 流水号分区，已推导
    pub order_day: NaiveDate,
    pub status: OrderStatus,
    pub draft: OrderDraft,
    pub now: DateTime<Utc>,
}

/// 按租户的列表过滤条件，最新的在前
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub kind: Option<OrderKind>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 为 `(tenant_id, order_day)` 分配下一个流水号并插入订单，原子完成。
    /// 返回已提交的订单。
    ///
    /// 分区竞争失败返回 `OrderError::SequenceConflict`，此时不落任何数据。
    async fn insert(&self, new: &NewOrder) -> OrderResult<Order>;

    /// 替换订单的可变字段，从不写 `order_seq` 和 `order_day`。
    /// 请求的状态在同一事务内与当前状态比对。
    async fn update(
        &self,
        tenant_id: &str,
        id: i64,
        draft: &OrderDraft,
        now: DateTime<Utc>,
    ) -> OrderResult<Order>;

    /// 校验状态变更后只更新 `status` 和 `updated_at`
    async fn update_status(
        &self,
        tenant_id: &str,
        id: i64,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> OrderResult<Order>;

    async fn find(&self, tenant_id: &str, id: i64) -> OrderResult<Option<Order>>;

    async fn list(&self, tenant_id: &str, query: &ListQuery) -> OrderResult<Vec<Order>>;
}
