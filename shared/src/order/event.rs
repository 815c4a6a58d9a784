//! Change notification published after an order mutation commits

use serde::{Deserialize, Serialize};

use super::model::Order;

/// Notification kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventType {
    OrderCreated,
    OrderUpdated,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderEventType::OrderCreated => write!(f, "order_created"),
            OrderEventType::OrderUpdated => write!(f, "order_updated"),
        }
    }
}

/// Event pushed to tenant subscribers
///
/// Carries the full order snapshot as committed. Subscribers that connect
/// later never see it; they rehydrate from `GET /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    #[serde(rename = "type")]
    pub event_type: OrderEventType,
    /// Event unique ID (UUID v4)
    pub event_id: String,
    /// Server timestamp (Unix milliseconds)
    pub ts: i64,
    pub company_id: String,
    pub order: Order,
}

impl OrderEvent {
    pub fn new(event_type: OrderEventType, order: Order) -> Self {
        Self {
            event_type,
            event_id: uuid::Uuid::new_v4().to_string(),
            ts: crate::util::now_millis(),
            company_id: order.tenant_id.clone(),
            order,
        }
    }

    pub fn created(order: Order) -> Self {
        Self::new(OrderEventType::OrderCreated, order)
    }

    pub fn updated(order: Order) -> Self {
        Self::new(OrderEventType::OrderUpdated, order)
    }
}
