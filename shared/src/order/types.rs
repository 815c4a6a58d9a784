//! Order vocabulary: kinds, statuses, payment methods, line items

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a wire string does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Order Kind
// ============================================================================

/// Order type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Prepared as soon as possible
    #[default]
    Active,
    /// Pre-order for a future time slot
    Scheduled,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Active => "active",
            OrderKind::Scheduled => "scheduled",
        }
    }
}

impl FromStr for OrderKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(OrderKind::Active),
            "scheduled" | "preorder" => Ok(OrderKind::Scheduled),
            _ => Err(UnknownVariant::new("order type", s)),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Order Status
// ============================================================================

/// Order status
///
/// `new → ready → enroute`; `paused` and `cancelled` are reachable from any
/// non-terminal state. `cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    New,
    Ready,
    Enroute,
    Paused,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Ready => "ready",
            OrderStatus::Enroute => "enroute",
            OrderStatus::Paused => "paused",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(OrderStatus::New),
            "ready" => Ok(OrderStatus::Ready),
            "enroute" => Ok(OrderStatus::Enroute),
            "paused" => Ok(OrderStatus::Paused),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(UnknownVariant::new("order status", s)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payment Method
// ============================================================================

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    /// Bank transfer
    Wire,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Wire => "wire",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "wire" | "transfer" => Ok(PaymentMethod::Wire),
            _ => Err(UnknownVariant::new("payment method", s)),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// List Tab
// ============================================================================

/// Order list filter used by the dispatcher screens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderTab {
    /// `orderType = active`
    Active,
    /// `orderType = scheduled`
    Preorders,
    #[default]
    All,
}

impl OrderTab {
    /// Kind filter implied by the tab (`None` = no filter)
    pub fn kind(&self) -> Option<OrderKind> {
        match self {
            OrderTab::Active => Some(OrderKind::Active),
            OrderTab::Preorders => Some(OrderKind::Scheduled),
            OrderTab::All => None,
        }
    }
}

// ============================================================================
// Line Items
// ============================================================================

/// Line item as persisted (normalized by the server)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Menu item reference (opaque)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Discount percent (0-100)
    #[serde(default)]
    pub discount: f64,
    pub quantity: i32,
}

/// Delivery address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub house: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// Door / intercom code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
