//! 内存订单仓储
//!
//! 与 PostgreSQL 仓储契约一致。每个操作先在受影响行的副本上暂存修改，
//! 到提交点才生效，提交中止时不留下计数器或订单。
//!
//! 故障注入，供测试覆盖 store 的失败路径:
//! - [`MemoryOrderRepository::abort_next_commit`]: 下一次写入在暂存后失败
//! - [`MemoryOrderRepository::inject_sequence_conflicts`]: 接下来 N 次插入输掉分区竞争
//! - [`MemoryOrderRepository::reset_counter`]: 丢弃分区计数器，下一次插入撞上唯一约束

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use shared::order::{Order, OrderStatus, format_order_no};

use super::{ListQuery, NewOrder, OrderRepository};
use crate::orders::{OrderDraft, OrderError, OrderResult, lifecycle};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    counters: HashMap<(String, NaiveDate), i64>,
    orders: BTreeMap<i64, Order>,
}

#[derive(Debug, Default)]
pub struct MemoryOrderRepository {
    state: Mutex<MemoryState>,
    abort_next_commit: AtomicBool,
    pending_conflicts: AtomicU32,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让下一次写入在提交点失败，暂存的修改全部丢弃
    pub fn abort_next_commit(&self) {
        self.abort_next_commit.store(true, Ordering::SeqCst);
    }

    /// 让接下来 `n` 次插入以 `SequenceConflict` 失败
    pub fn inject_sequence_conflicts(&self, n: u32) {
        self.pending_conflicts.store(n, Ordering::SeqCst);
    }

    /// 丢弃分区计数器，保留已有订单
    pub fn reset_counter(&self, tenant_id: &str, day: NaiveDate) {
        self.state
            .lock()
            .counters
            .remove(&(tenant_id.to_string(), day));
    }

    /// 分区最后发出的流水号
    pub fn counter(&self, tenant_id: &str, day: NaiveDate) -> Option<i64> {
        self.state
            .lock()
            .counters
            .get(&(tenant_id.to_string(), day))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.state.lock().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn commit_point(&self) -> OrderResult<()> {
        if self.abort_next_commit.swap(false, Ordering::SeqCst) {
            return Err(OrderError::persistence("commit aborted"));
        }
        Ok(())
    }

    fn load<'a>(state: &'a MemoryState, tenant_id: &str, id: i64) -> OrderResult<&'a Order> {
        state
            .orders
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .ok_or(OrderError::NotFound(id))
    }
}

fn apply_draft(order: &mut Order, draft: &OrderDraft) {
    order.order_type = draft.kind;
    order.customer = draft.customer.clone();
    order.phone = draft.phone.clone();
    order.payment_method = draft.payment_method;
    order.address = draft.address.clone();
    order.notes = draft.notes.clone();
    order.courier_id = draft.courier_id.clone();
    order.pickup_id = draft.pickup_id.clone();
    order.items = draft.items.clone();
    order.amount_subtotal = draft.totals.subtotal;
    order.amount_discount = draft.totals.discount;
    order.amount_total = draft.totals.total;
    order.scheduled_at = draft.scheduled_at;
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, new: &NewOrder) -> OrderResult<Order> {
        if self.take_conflict() {
            return Err(OrderError::SequenceConflict);
        }

        let mut state = self.state.lock();
        let key = (new.tenant_id.clone(), new.order_day);
        let seq = state.counters.get(&key).copied().unwrap_or(0) + 1;

        let taken = state.orders.values().any(|o| {
            o.tenant_id == new.tenant_id && o.order_day == new.order_day && o.order_seq == seq
        });
        if taken {
            return Err(OrderError::SequenceTaken);
        }

        let id = state.next_id + 1;
        let mut order = Order {
            id,
            tenant_id: new.tenant_id.clone(),
            order_no: format_order_no(new.order_day, seq),
            order_seq: seq,
            order_day: new.order_day,
            order_type: new.draft.kind,
            status: new.status,
            customer: String::new(),
            phone: String::new(),
            payment_method: new.draft.payment_method,
            address: Default::default(),
            notes: None,
            courier_id: None,
            pickup_id: None,
            items: Vec::new(),
            amount_subtotal: 0.0,
            amount_discount: 0.0,
            amount_total: 0.0,
            scheduled_at: None,
            created_at: new.now,
            updated_at: new.now,
        };
        apply_draft(&mut order, &new.draft);

        self.commit_point()?;
        state.next_id = id;
        state.counters.insert(key, seq);
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn update(
        &self,
        tenant_id: &str,
        id: i64,
        draft: &OrderDraft,
        now: DateTime<Utc>,
    ) -> OrderResult<Order> {
        let mut state = self.state.lock();
        let mut order = Self::load(&state, tenant_id, id)?.clone();

        if let Some(to) = draft.requested_status {
            lifecycle::ensure_transition(order.status, to)?;
            order.status = to;
        }
        apply_draft(&mut order, draft);
        order.updated_at = now;

        self.commit_point()?;
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn update_status(
        &self,
        tenant_id: &str,
        id: i64,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> OrderResult<Order> {
        let mut state = self.state.lock();
        let mut order = Self::load(&state, tenant_id, id)?.clone();

        lifecycle::ensure_transition(order.status, status)?;
        order.status = status;
        order.updated_at = now;

        self.commit_point()?;
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find(&self, tenant_id: &str, id: i64) -> OrderResult<Option<Order>> {
        let state = self.state.lock();
        Ok(state
            .orders
            .get(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .cloned())
    }

    async fn list(&self, tenant_id: &str, query: &ListQuery) -> OrderResult<Vec<Order>> {
        let state = self.state.lock();
        let mut orders: Vec<&Order> = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id)
            .filter(|o| query.kind.is_none_or(|k| o.order_type == k))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(orders
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{OrderKind, OrderPayload, SelectedItem};

    fn draft() -> OrderDraft {
        OrderDraft::from_payload(&OrderPayload {
            customer: Some("Ana".into()),
            phone: Some("600".into()),
            payment: Some("card".into()),
            selected_items: vec![SelectedItem {
                id: Some("1".into()),
                name: "Menu".into(),
                price: 9.99,
                discount: 0.0,
                quantity: 1,
            }],
            ..Default::default()
        })
        .unwrap()
    }

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    fn new_order(tenant: &str, now: DateTime<Utc>) -> NewOrder {
        NewOrder {
            tenant_id: tenant.into(),
            order_day: now.date_naive(),
            status: OrderStatus::New,
            draft: draft(),
            now,
        }
    }

    #[tokio::test]
    async fn insert_numbers_per_partition() {
        let repo = MemoryOrderRepository::new();
        let d20 = at("2024-09-20T09:00:00Z");

        let a = repo.insert(&new_order("t1", d20)).await.unwrap();
        let b = repo.insert(&new_order("t1", d20)).await.unwrap();
        let c = repo.insert(&new_order("t2", d20)).await.unwrap();

        assert_eq!((a.order_seq, b.order_seq, c.order_seq), (1, 2, 1));
        assert_eq!(b.order_no, "20240920-002");
        assert_eq!(repo.counter("t1", d20.date_naive()), Some(2));
        assert_eq!(repo.len(), 3);
    }

    #[tokio::test]
    async fn aborted_commit_leaves_nothing_behind() {
        let repo = MemoryOrderRepository::new();
        let now = at("2024-09-20T09:00:00Z");

        repo.abort_next_commit();
        assert!(matches!(
            repo.insert(&new_order("t1", now)).await,
            Err(OrderError::Persistence(_))
        ));
        assert!(repo.is_empty());
        assert_eq!(repo.counter("t1", now.date_naive()), None);

        let order = repo.insert(&new_order("t1", now)).await.unwrap();
        assert_eq!(order.order_seq, 1);
    }

    #[tokio::test]
    async fn injected_conflicts_are_consumed() {
        let repo = MemoryOrderRepository::new();
        let now = at("2024-09-20T09:00:00Z");

        repo.inject_sequence_conflicts(2);
        for _ in 0..2 {
            assert!(matches!(
                repo.insert(&new_order("t1", now)).await,
                Err(OrderError::SequenceConflict)
            ));
        }
        assert_eq!(repo.insert(&new_order("t1", now)).await.unwrap().order_seq, 1);
    }

    #[tokio::test]
    async fn lost_counter_hits_the_backstop() {
        let repo = MemoryOrderRepository::new();
        let now = at("2024-09-20T09:00:00Z");
        repo.insert(&new_order("t1", now)).await.unwrap();

        repo.reset_counter("t1", now.date_naive());
        assert!(matches!(
            repo.insert(&new_order("t1", now)).await,
            Err(OrderError::SequenceTaken)
        ));
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.counter("t1", now.date_naive()), None);
    }

    #[tokio::test]
    async fn list_is_tenant_scoped_and_newest_first() {
        let repo = MemoryOrderRepository::new();
        repo.insert(&new_order("t1", at("2024-09-20T09:00:00Z")))
            .await
            .unwrap();
        repo.insert(&new_order("t2", at("2024-09-20T09:30:00Z")))
            .await
            .unwrap();
        let mut scheduled = new_order("t1", at("2024-09-20T10:00:00Z"));
        scheduled.draft.kind = OrderKind::Scheduled;
        repo.insert(&scheduled).await.unwrap();

        let all = repo
            .list(
                "t1",
                &ListQuery {
                    kind: None,
                    limit: 50,
                    offset: 0,
                },
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].order_type, OrderKind::Scheduled);

        let active = repo
            .list(
                "t1",
                &ListQuery {
                    kind: Some(OrderKind::Active),
                    limit: 50,
                    offset: 0,
                },
            )
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].order_seq, 1);
    }

    #[tokio::test]
    async fn other_tenant_cannot_see_or_touch() {
        let repo = MemoryOrderRepository::new();
        let order = repo
            .insert(&new_order("t1", at("2024-09-20T09:00:00Z")))
            .await
            .unwrap();

        assert!(repo.find("t2", order.id).await.unwrap().is_none());
        assert!(matches!(
            repo.update_status("t2", order.id, OrderStatus::Ready, Utc::now())
                .await,
            Err(OrderError::NotFound(_))
        ));
    }
}
