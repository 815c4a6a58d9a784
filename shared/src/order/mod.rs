//! Order wire types
//!
//! - Types: kinds, statuses, payment methods, line items
//! - Model: the committed order (`OrderDto`) and request payloads
//! - Events: notifications fanned out to tenant subscribers

pub mod event;
pub mod model;
pub mod types;

// Re-exports
pub use event::{OrderEvent, OrderEventType};
pub use model::{Order, OrderPayload, SelectedItem, StatusPayload, format_order_no};
pub use types::*;
