//! 订单生命周期：payload 校验与状态机
//!
//! ```text
//!   new ──► ready ──► enroute
//!    │        │          │
//!    ├────────┴──────────┴──► paused ──► (resume: new | ready | enroute)
//!    │                          │
//!    └──────────────────────────┴──► cancelled (terminal)
//! ```

use chrono::{DateTime, Utc};
use shared::order::{
    Address, OrderItem, OrderKind, OrderPayload, OrderStatus, PaymentMethod,
};

use super::error::OrderError;
use super::money::{self, Totals};

/// 已校验、已规范化、可直接写入的订单字段
///
/// 在开启任何事务之前由客户端 payload 构建。
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub kind: OrderKind,
    pub customer: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    pub address: Address,
    pub notes: Option<String>,
    pub courier_id: Option<String>,
    pub pickup_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub totals: Totals,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 调用方请求的状态，已解析，尚未与当前状态比对
    pub requested_status: Option<OrderStatus>,
}

impl OrderDraft {
    pub fn from_payload(payload: &OrderPayload) -> Result<Self, OrderError> {
        let customer = required(&payload.customer, "customer")?;
        let phone = required(&payload.phone, "phone")?;
        let payment_method = parse_payment(payload.payment.as_deref())?;

        let kind = match non_blank(&payload.order_type) {
            None => OrderKind::Active,
            Some(raw) => raw
                .parse()
                .map_err(|_| OrderError::Validation(format!("unknown orderType: {raw}")))?,
        };
        if kind == OrderKind::Scheduled && payload.scheduled_at.is_none() {
            return Err(OrderError::Validation(
                "scheduledAt is required for scheduled orders".to_string(),
            ));
        }

        let requested_status = non_blank(&payload.status).map(parse_status).transpose()?;

        let items = money::normalize_items(&payload.selected_items)?;
        let totals = money::compute_totals(&items);

        Ok(Self {
            kind,
            customer,
            phone,
            payment_method,
            address: Address {
                street: non_blank(&payload.street).unwrap_or_default(),
                house: non_blank(&payload.house).unwrap_or_default(),
                building: non_blank(&payload.building),
                apartment: non_blank(&payload.apartment),
                floor: non_blank(&payload.floor),
                code: non_blank(&payload.code),
            },
            notes: non_blank(&payload.notes),
            courier_id: non_blank(&payload.courier_id),
            pickup_id: non_blank(&payload.pickup_id),
            items,
            totals,
            scheduled_at: payload.scheduled_at,
            requested_status,
        })
    }

    /// 新订单的初始状态
    ///
    /// 显式指定时只接受 `new`。
    pub fn initial_status(&self) -> Result<OrderStatus, OrderError> {
        match self.requested_status {
            None | Some(OrderStatus::New) => Ok(OrderStatus::New),
            Some(to) => Err(OrderError::InvalidTransition {
                from: OrderStatus::New,
                to,
            }),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required(value: &Option<String>, field: &str) -> Result<String, OrderError> {
    non_blank(value).ok_or_else(|| OrderError::Validation(format!("{field} is required")))
}

/// 严格解析支付方式：空值是校验错误，未知值直接拒绝
pub fn parse_payment(raw: Option<&str>) -> Result<PaymentMethod, OrderError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OrderError::Validation("payment is required".to_string()))?;
    raw.parse()
        .map_err(|_| OrderError::InvalidPaymentMethod(raw.to_string()))
}

/// 按固定状态集合严格解析状态
pub fn parse_status(raw: String) -> Result<OrderStatus, OrderError> {
    raw.parse().map_err(|_| OrderError::InvalidStatus(raw))
}

/// `from → to` 是否允许
///
/// 未终结订单的同状态变更视为幂等更新。
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    if from.is_terminal() {
        return false;
    }
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (_, Paused)
            | (_, Cancelled)
            | (New, Ready)
            | (Ready, Enroute)
            | (Paused, New | Ready | Enroute)
    )
}

pub fn ensure_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::SelectedItem;
    use OrderStatus::*;

    fn payload() -> OrderPayload {
        OrderPayload {
            customer: Some("Ana".into()),
            phone: Some("600 000 000".into()),
            payment: Some("card".into()),
            selected_items: vec![SelectedItem {
                id: Some("12".into()),
                name: "Pizza".into(),
                price: 10.0,
                discount: 10.0,
                quantity: 2,
            }],
            street: Some(" Gran Via ".into()),
            house: Some("1".into()),
            building: Some("".into()),
            ..Default::default()
        }
    }

    #[test]
    fn draft_normalizes_payload() {
        let draft = OrderDraft::from_payload(&payload()).unwrap();
        assert_eq!(draft.kind, OrderKind::Active);
        assert_eq!(draft.payment_method, PaymentMethod::Card);
        assert_eq!(draft.address.street, "Gran Via");
        assert_eq!(draft.address.building, None);
        assert_eq!(draft.totals.subtotal, 20.0);
        assert_eq!(draft.totals.discount, 2.0);
        assert_eq!(draft.totals.total, 18.0);
        assert_eq!(draft.initial_status().unwrap(), New);
    }

    #[test]
    fn missing_required_fields_fail_validation() {
        for field in ["customer", "phone"] {
            let mut p = payload();
            match field {
                "customer" => p.customer = Some("   ".into()),
                _ => p.phone = None,
            }
            let err = OrderDraft::from_payload(&p).unwrap_err();
            assert!(matches!(err, OrderError::Validation(ref m) if m.contains(field)));
        }

        let mut p = payload();
        p.payment = None;
        assert!(matches!(
            OrderDraft::from_payload(&p),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn unknown_payment_is_rejected() {
        let mut p = payload();
        p.payment = Some("bitcoin".into());
        assert!(matches!(
            OrderDraft::from_payload(&p),
            Err(OrderError::InvalidPaymentMethod(ref m)) if m == "bitcoin"
        ));
    }

    #[test]
    fn scheduled_requires_scheduled_at() {
        let mut p = payload();
        p.order_type = Some("scheduled".into());
        assert!(matches!(
            OrderDraft::from_payload(&p),
            Err(OrderError::Validation(_))
        ));

        p.scheduled_at = Some(Utc::now());
        assert_eq!(
            OrderDraft::from_payload(&p).unwrap().kind,
            OrderKind::Scheduled
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut p = payload();
        p.status = Some("delivered".into());
        assert!(matches!(
            OrderDraft::from_payload(&p),
            Err(OrderError::InvalidStatus(ref s)) if s == "delivered"
        ));
    }

    #[test]
    fn initial_status_must_be_new() {
        let mut p = payload();
        p.status = Some("ready".into());
        let draft = OrderDraft::from_payload(&p).unwrap();
        assert!(matches!(
            draft.initial_status(),
            Err(OrderError::InvalidTransition { from: New, to: Ready })
        ));
    }

    #[test]
    fn forward_path() {
        assert!(can_transition(New, Ready));
        assert!(can_transition(Ready, Enroute));
        assert!(!can_transition(New, Enroute));
        assert!(!can_transition(Enroute, Ready));
        assert!(!can_transition(Ready, New));
    }

    #[test]
    fn pause_and_cancel_from_any_live_state() {
        for from in [New, Ready, Enroute, Paused] {
            assert!(can_transition(from, Paused), "{from} -> paused");
            assert!(can_transition(from, Cancelled), "{from} -> cancelled");
        }
    }

    #[test]
    fn paused_resumes() {
        for to in [New, Ready, Enroute] {
            assert!(can_transition(Paused, to));
        }
    }

    #[test]
    fn cancelled_is_terminal() {
        for to in [New, Ready, Enroute, Paused, Cancelled] {
            assert!(!can_transition(Cancelled, to));
        }
        assert!(matches!(
            ensure_transition(Cancelled, New),
            Err(OrderError::InvalidTransition { from: Cancelled, to: New })
        ));
    }

    #[test]
    fn same_status_is_idempotent() {
        assert!(ensure_transition(Ready, Ready).is_ok());
    }
}
