//! 基于内存仓储的订单编号端到端测试

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use order_cloud::db::MemoryOrderRepository;
use order_cloud::live::{ChangeNotifier, OrderHub};
use order_cloud::orders::money::compute_totals;
use order_cloud::orders::{ManualClock, OrderDraft, OrderError, OrderStore, RetryPolicy};
use shared::order::{OrderEventType, OrderKind, OrderPayload, OrderStatus, SelectedItem};

struct Harness {
    store: OrderStore,
    repo: Arc<MemoryOrderRepository>,
    hub: OrderHub,
    clock: Arc<ManualClock>,
}

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn harness(now: &str) -> Harness {
    let repo = Arc::new(MemoryOrderRepository::new());
    let hub = OrderHub::default();
    let clock = Arc::new(ManualClock::new(ts(now)));
    let notifier: Arc<dyn ChangeNotifier> = Arc::new(hub.clone());
    let store = OrderStore::new(
        repo.clone(),
        notifier,
        clock.clone(),
        RetryPolicy::immediate(5),
    );
    Harness {
        store,
        repo,
        hub,
        clock,
    }
}

fn active() -> OrderPayload {
    OrderPayload {
        customer: Some("Ana".into()),
        phone: Some("+34 600 000 000".into()),
        payment: Some("card".into()),
        selected_items: vec![
            SelectedItem {
                id: Some("p1".into()),
                name: "Margherita".into(),
                price: 9.95,
                discount: 33.0,
                quantity: 3,
            },
            SelectedItem {
                id: Some("d1".into()),
                name: "Cola".into(),
                price: 2.5,
                discount: 0.0,
                quantity: 1,
            },
        ],
        street: Some("Gran Via".into()),
        house: Some("12".into()),
        ..Default::default()
    }
}

fn scheduled(at: &str) -> OrderPayload {
    OrderPayload {
        order_type: Some("scheduled".into()),
        scheduled_at: Some(ts(at)),
        ..active()
    }
}

#[tokio::test]
async fn two_tenant_reservation_scenario() {
    let h = harness("2024-09-20T09:00:00Z");

    for expected in 1..=3 {
        let order = h.store.create_order("T1", &active()).await.unwrap();
        assert_eq!(order.order_day, day("2024-09-20"));
        assert_eq!(order.order_seq, expected);
    }

    let t2 = h.store.create_order("T2", &active()).await.unwrap();
    assert_eq!(t2.order_seq, 1);

    let pre1 = h
        .store
        .create_order("T1", &scheduled("2024-09-21T10:00:00Z"))
        .await
        .unwrap();
    assert_eq!(pre1.order_day, day("2024-09-21"));
    assert_eq!(pre1.order_seq, 1);
    assert_eq!(pre1.order_no, "20240921-001");

    let pre2 = h
        .store
        .create_order("T1", &scheduled("2024-09-21T18:30:00Z"))
        .await
        .unwrap();
    assert_eq!(pre2.order_seq, 2);

    h.clock.set(ts("2024-09-21T08:00:00Z"));
    let next_day = h.store.create_order("T1", &active()).await.unwrap();
    assert_eq!(next_day.order_day, day("2024-09-21"));
    assert_eq!(next_day.order_seq, 3);

    assert_eq!(h.repo.counter("T1", day("2024-09-20")), Some(3));
    assert_eq!(h.repo.counter("T1", day("2024-09-21")), Some(3));
    assert_eq!(h.repo.counter("T2", day("2024-09-20")), Some(1));
    assert_eq!(h.repo.counter("T2", day("2024-09-21")), None);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_sequences() {
    let h = harness("2024-09-20T09:00:00Z");

    let mut handles = Vec::new();
    for _ in 0..64 {
        let store = h.store.clone();
        handles.push(tokio::spawn(async move {
            store.create_order("T1", &active()).await
        }));
    }

    let mut seqs = HashSet::new();
    for handle in handles {
        let order = handle.await.unwrap().unwrap();
        assert!(seqs.insert(order.order_seq), "duplicate {}", order.order_seq);
    }
    assert_eq!(seqs, (1..=64).collect::<HashSet<i64>>());
}

#[tokio::test]
async fn sequence_and_day_are_write_once() {
    let h = harness("2024-09-20T09:00:00Z");
    let order = h.store.create_order("T1", &active()).await.unwrap();

    let moved = h
        .store
        .update_order("T1", order.id, &scheduled("2024-09-25T12:00:00Z"))
        .await
        .unwrap();
    assert_eq!(moved.order_type, OrderKind::Scheduled);
    assert_eq!(moved.scheduled_at, Some(ts("2024-09-25T12:00:00Z")));
    assert_eq!(moved.order_seq, order.order_seq);
    assert_eq!(moved.order_day, order.order_day);
    assert_eq!(moved.order_no, order.order_no);
    assert_eq!(moved.created_at, order.created_at);

    assert_eq!(h.repo.counter("T1", day("2024-09-25")), None);
}

#[tokio::test]
async fn aborted_create_publishes_nothing() {
    let h = harness("2024-09-20T09:00:00Z");
    let mut sub = h.hub.subscribe("T1");

    h.repo.abort_next_commit();
    let err = h.store.create_order("T1", &active()).await.unwrap_err();
    assert!(matches!(err, OrderError::Persistence(_)));
    assert!(h.repo.is_empty());

    assert!(
        tokio::time::timeout(Duration::from_millis(50), sub.recv())
            .await
            .is_err(),
        "no event may follow a rolled back create"
    );

    // 中止的尝试既不留空号也不产生重号
    let order = h.store.create_order("T1", &active()).await.unwrap();
    assert_eq!(order.order_seq, 1);
    let event = sub.recv().await.unwrap();
    assert_eq!(event.event_type, OrderEventType::OrderCreated);
    assert_eq!(event.order.id, order.id);
}

#[tokio::test]
async fn events_follow_every_committed_mutation() {
    let h = harness("2024-09-20T09:00:00Z");
    let mut t1 = h.hub.subscribe("T1");
    let mut t2 = h.hub.subscribe("T2");

    let order = h.store.create_order("T1", &active()).await.unwrap();
    h.store
        .transition_status("T1", order.id, "ready")
        .await
        .unwrap();
    let mut edit = active();
    edit.notes = Some("ring twice".into());
    h.store.update_order("T1", order.id, &edit).await.unwrap();

    let created = t1.recv().await.unwrap();
    assert_eq!(created.event_type, OrderEventType::OrderCreated);
    assert_eq!(created.company_id, "T1");

    let ready = t1.recv().await.unwrap();
    assert_eq!(ready.event_type, OrderEventType::OrderUpdated);
    assert_eq!(ready.order.status, OrderStatus::Ready);

    let edited = t1.recv().await.unwrap();
    assert_eq!(edited.order.notes.as_deref(), Some("ring twice"));
    // 不带状态的更新保留当前状态
    assert_eq!(edited.order.status, OrderStatus::Ready);

    let ids: HashSet<_> = [&created, &ready, &edited]
        .iter()
        .map(|e| e.event_id.clone())
        .collect();
    assert_eq!(ids.len(), 3);

    assert!(
        tokio::time::timeout(Duration::from_millis(50), t2.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn rejected_transition_publishes_nothing() {
    let h = harness("2024-09-20T09:00:00Z");
    let order = h.store.create_order("T1", &active()).await.unwrap();
    h.store
        .transition_status("T1", order.id, "cancelled")
        .await
        .unwrap();

    let mut sub = h.hub.subscribe("T1");
    let err = h
        .store
        .transition_status("T1", order.id, "new")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::New
        }
    ));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), sub.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn conflicts_retry_within_bound() {
    let h = harness("2024-09-20T09:00:00Z");

    h.repo.inject_sequence_conflicts(4);
    let order = h.store.create_order("T1", &active()).await.unwrap();
    assert_eq!(order.order_seq, 1);

    h.repo.inject_sequence_conflicts(5);
    let err = h.store.create_order("T1", &active()).await.unwrap_err();
    assert!(matches!(err, OrderError::ContentionExceeded { attempts: 5 }));

    assert_eq!(h.repo.len(), 1);
    let next = h.store.create_order("T1", &active()).await.unwrap();
    assert_eq!(next.order_seq, 2);
}

#[tokio::test]
async fn totals_are_recomputed_and_idempotent() {
    let h = harness("2024-09-20T09:00:00Z");

    let mut payload = active();
    payload.payment = Some("transfer".into());
    let order = h.store.create_order("T1", &payload).await.unwrap();

    // 3 x 9.95 = 29.85，33% 折扣 = 9.85（9.8505 按行舍入），再加 2.50
    assert_eq!(order.amount_subtotal, 32.35);
    assert_eq!(order.amount_discount, 9.85);
    assert_eq!(order.amount_total, 22.5);

    let draft = OrderDraft::from_payload(&payload).unwrap();
    assert_eq!(compute_totals(&draft.items), compute_totals(&draft.items));
    assert_eq!(compute_totals(&order.items).total, order.amount_total);
}
