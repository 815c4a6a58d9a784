//! PostgreSQL 订单仓储

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::order::{Address, Order, OrderItem, OrderStatus, format_order_no};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{ListQuery, NewOrder, OrderRepository, sequence};
use crate::orders::{OrderDraft, OrderError, OrderResult, lifecycle};

const ORDER_COLUMNS: &str = r#"
    id, tenant_id, order_type, order_day, order_seq, status,
    customer, phone, payment_method,
    street, house, building, apartment, floor, door_code,
    notes, courier_id, pickup_id, items,
    amount_subtotal, amount_discount, amount_total,
    scheduled_at, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    tenant_id: String,
    order_type: String,
    order_day: NaiveDate,
    order_seq: i64,
    status: String,
    customer: String,
    phone: String,
    payment_method: String,
    street: String,
    house: String,
    building: Option<String>,
    apartment: Option<String>,
    floor: Option<String>,
    door_code: Option<String>,
    notes: Option<String>,
    courier_id: Option<String>,
    pickup_id: Option<String>,
    items: Json<Vec<OrderItem>>,
    amount_subtotal: f64,
    amount_discount: f64,
    amount_total: f64,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        // CHECK 约束保证取值合法，解析失败说明 schema 不一致
        let order_type = row
            .order_type
            .parse()
            .map_err(|e| OrderError::persistence(format!("order {}: {e}", row.id)))?;
        let status = row
            .status
            .parse()
            .map_err(|e| OrderError::persistence(format!("order {}: {e}", row.id)))?;
        let payment_method = row
            .payment_method
            .parse()
            .map_err(|e| OrderError::persistence(format!("order {}: {e}", row.id)))?;

        Ok(Order {
            id: row.id,
            order_no: format_order_no(row.order_day, row.order_seq),
            tenant_id: row.tenant_id,
            order_seq: row.order_seq,
            order_day: row.order_day,
            order_type,
            status,
            customer: row.customer,
            phone: row.phone,
            payment_method,
            address: Address {
                street: row.street,
                house: row.house,
                building: row.building,
                apartment: row.apartment,
                floor: row.floor,
                code: row.door_code,
            },
            notes: row.notes,
            courier_id: row.courier_id,
            pickup_id: row.pickup_id,
            items: row.items.0,
            amount_subtotal: row.amount_subtotal,
            amount_discount: row.amount_discount,
            amount_total: row.amount_total,
            scheduled_at: row.scheduled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_status(
        tx: &mut sqlx::PgConnection,
        tenant_id: &str,
        id: i64,
    ) -> OrderResult<OrderStatus> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM orders WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let status = status.ok_or(OrderError::NotFound(id))?;
        status
            .parse()
            .map_err(|e| OrderError::persistence(format!("order {id}: {e}")))
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, new: &NewOrder) -> OrderResult<Order> {
        let draft = &new.draft;
        let mut tx = self.pool.begin().await?;

        let seq = sequence::allocate(
            &mut tx,
            &new.tenant_id,
            new.order_day,
            new.now.timestamp_millis(),
        )
        .await?;

        let sql = format!(
            r#"
            INSERT INTO orders (
                tenant_id, order_type, order_day, order_seq, status,
                customer, phone, payment_method,
                street, house, building, apartment, floor, door_code,
                notes, courier_id, pickup_id, items,
                amount_subtotal, amount_discount, amount_total,
                scheduled_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $23)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(&new.tenant_id)
            .bind(draft.kind.as_str())
            .bind(new.order_day)
            .bind(seq)
            .bind(new.status.as_str())
            .bind(&draft.customer)
            .bind(&draft.phone)
            .bind(draft.payment_method.as_str())
            .bind(&draft.address.street)
            .bind(&draft.address.house)
            .bind(&draft.address.building)
            .bind(&draft.address.apartment)
            .bind(&draft.address.floor)
            .bind(&draft.address.code)
            .bind(&draft.notes)
            .bind(&draft.courier_id)
            .bind(&draft.pickup_id)
            .bind(Json(&draft.items))
            .bind(draft.totals.subtotal)
            .bind(draft.totals.discount)
            .bind(draft.totals.total)
            .bind(draft.scheduled_at)
            .bind(new.now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn update(
        &self,
        tenant_id: &str,
        id: i64,
        draft: &OrderDraft,
        now: DateTime<Utc>,
    ) -> OrderResult<Order> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_status(&mut tx, tenant_id, id).await?;
        let status = match draft.requested_status {
            Some(to) => {
                lifecycle::ensure_transition(current, to)?;
                to
            }
            None => current,
        };

        let sql = format!(
            r#"
            UPDATE orders SET
                order_type = $3, status = $4,
                customer = $5, phone = $6, payment_method = $7,
                street = $8, house = $9, building = $10, apartment = $11,
                floor = $12, door_code = $13,
                notes = $14, courier_id = $15, pickup_id = $16, items = $17,
                amount_subtotal = $18, amount_discount = $19, amount_total = $20,
                scheduled_at = $21, updated_at = $22
            WHERE tenant_id = $1 AND id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(draft.kind.as_str())
            .bind(status.as_str())
            .bind(&draft.customer)
            .bind(&draft.phone)
            .bind(draft.payment_method.as_str())
            .bind(&draft.address.street)
            .bind(&draft.address.house)
            .bind(&draft.address.building)
            .bind(&draft.address.apartment)
            .bind(&draft.address.floor)
            .bind(&draft.address.code)
            .bind(&draft.notes)
            .bind(&draft.courier_id)
            .bind(&draft.pickup_id)
            .bind(Json(&draft.items))
            .bind(draft.totals.subtotal)
            .bind(draft.totals.discount)
            .bind(draft.totals.total)
            .bind(draft.scheduled_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn update_status(
        &self,
        tenant_id: &str,
        id: i64,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> OrderResult<Order> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_status(&mut tx, tenant_id, id).await?;
        lifecycle::ensure_transition(current, status)?;

        let sql = format!(
            "UPDATE orders SET status = $3, updated_at = $4 \
             WHERE tenant_id = $1 AND id = $2 RETURNING {ORDER_COLUMNS}"
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .bind(status.as_str())
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn find(&self, tenant_id: &str, id: i64) -> OrderResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND id = $2");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list(&self, tenant_id: &str, query: &ListQuery) -> OrderResult<Vec<Order>> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE tenant_id = $1 AND ($2::TEXT IS NULL OR order_type = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(query.kind.map(|k| k.as_str()))
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Order::try_from).collect()
    }
}
