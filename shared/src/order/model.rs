//! Order entity as exposed over the API, plus request payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::types::{Address, OrderItem, OrderKind, OrderStatus, PaymentMethod};
use crate::util::de_opt_string_or_number;

/// Committed order (the `OrderDto` on the wire)
///
/// `order_seq` and `order_day` are assigned once at creation and never
/// change afterwards, even if `order_type` or `scheduled_at` are edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Store-generated primary key
    pub id: i64,
    /// Owning tenant
    #[serde(rename = "companyId")]
    pub tenant_id: String,
    /// Display number, `YYYYMMDD-NNN`
    pub order_no: String,
    /// Daily sequence within `(tenant_id, order_day)`
    pub order_seq: i64,
    /// Operational day (sequence partition)
    pub order_day: NaiveDate,
    pub order_type: OrderKind,
    pub status: OrderStatus,
    pub customer: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub amount_subtotal: f64,
    pub amount_discount: f64,
    pub amount_total: f64,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Format the display number for a partition slot
///
/// ```
/// use chrono::NaiveDate;
/// let day = NaiveDate::from_ymd_opt(2024, 9, 20).unwrap();
/// assert_eq!(shared::order::format_order_no(day, 7), "20240920-007");
/// assert_eq!(shared::order::format_order_no(day, 1234), "20240920-1234");
/// ```
pub fn format_order_no(day: NaiveDate, seq: i64) -> String {
    format!("{}-{:03}", day.format("%Y%m%d"), seq)
}

/// Line item as submitted by the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedItem {
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    /// Discount percent (0-100)
    #[serde(default)]
    pub discount: f64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Body of `POST /api/orders` and `PUT /api/orders/{id}`
///
/// Enumerated fields stay as raw strings here so the lifecycle layer can
/// report precisely which value was rejected. Caller-computed totals are not
/// part of the payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub payment: Option<String>,
    #[serde(default)]
    pub selected_items: Vec<SelectedItem>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub apartment: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub courier_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_or_number")]
    pub pickup_id: Option<String>,
    /// Only honoured on update
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `PATCH /api/orders/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}
