//! 每日流水号分配（独立计数器表）
//!
//! `order_daily_counters` 中每个 `(tenant_id, order_day)` 一行，记录最后发出的号。
//! 分配是一条 upsert：不存在则建行为 1，存在则加一，返回新值。
//! 必须在调用方的事务上执行，订单插入中止时自增一起回滚。

use chrono::NaiveDate;
use sqlx::PgConnection;

/// 分区的下一个流水号，恒 `>= 1`
///
/// 新分区的并发首次分配由主键串行化：插入失败的一方在胜者提交后走 update 分支。
pub async fn allocate(
    conn: &mut PgConnection,
    tenant_id: &str,
    order_day: NaiveDate,
    now_millis: i64,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO order_daily_counters (tenant_id, order_day, last_seq, updated_at)
        VALUES ($1, $2, 1, $3)
        ON CONFLICT (tenant_id, order_day) DO UPDATE SET
            last_seq = order_daily_counters.last_seq + 1,
            updated_at = EXCLUDED.updated_at
        RETURNING last_seq
        "#,
    )
    .bind(tenant_id)
    .bind(order_day)
    .bind(now_millis)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.0)
}

/// 分区当前已发出的最大号（`None` 表示从未分配）
pub async fn current(
    conn: &mut PgConnection,
    tenant_id: &str,
    order_day: NaiveDate,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT last_seq FROM order_daily_counters WHERE tenant_id = $1 AND order_day = $2",
    )
    .bind(tenant_id)
    .bind(order_day)
    .fetch_optional(&mut *conn)
    .await
}
