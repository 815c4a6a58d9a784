//! 营业日推导
//!
//! 营业日是每日流水号的分区键，日期按 UTC 计算。

use chrono::{DateTime, NaiveDate, Utc};
use shared::order::OrderKind;

/// 推导新订单的流水号分区日
///
/// 带 `scheduled_at` 的预约单占用预约当天的号段，其余订单落在 `now` 当天。
/// 只在创建时计算一次，之后固定在订单上。
pub fn derive_operational_day(
    kind: OrderKind,
    scheduled_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> NaiveDate {
    match (kind, scheduled_at) {
        (OrderKind::Scheduled, Some(at)) => at.date_naive(),
        _ => now.date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn active_order_uses_today() {
        let now = ts("2024-09-20T23:59:59Z");
        assert_eq!(
            derive_operational_day(OrderKind::Active, None, now),
            day(2024, 9, 20)
        );
    }

    #[test]
    fn active_order_ignores_scheduled_at() {
        let now = ts("2024-09-20T12:00:00Z");
        let at = ts("2024-09-25T12:00:00Z");
        assert_eq!(
            derive_operational_day(OrderKind::Active, Some(at), now),
            day(2024, 9, 20)
        );
    }

    #[test]
    fn scheduled_order_uses_scheduled_date() {
        let now = ts("2024-09-20T12:00:00Z");
        let at = ts("2024-09-21T10:00:00Z");
        assert_eq!(
            derive_operational_day(OrderKind::Scheduled, Some(at), now),
            day(2024, 9, 21)
        );
    }

    #[test]
    fn scheduled_without_time_falls_back_to_today() {
        let now = ts("2024-09-20T12:00:00Z");
        assert_eq!(
            derive_operational_day(OrderKind::Scheduled, None, now),
            day(2024, 9, 20)
        );
    }

    #[test]
    fn offsets_are_truncated_in_utc() {
        // +03:00 的 01:30 在 UTC 仍是前一天
        let now = ts("2024-09-20T12:00:00Z");
        let at = ts("2024-09-22T01:30:00+03:00");
        assert_eq!(
            derive_operational_day(OrderKind::Scheduled, Some(at), now),
            day(2024, 9, 21)
        );
    }
}
