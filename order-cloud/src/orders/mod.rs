//! 订单编号与生命周期核心
//!
//! - [`lifecycle`]: payload 校验与状态机
//! - [`money`]: 明细规范化与金额汇总
//! - [`operational_day`]: 流水号分区推导
//! - [`retry`]: 分区竞争的退避策略
//! - [`store`]: 事务编排，先提交后通知

pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod operational_day;
pub mod retry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{OrderError, OrderResult};
pub use lifecycle::OrderDraft;
pub use operational_day::derive_operational_day;
pub use retry::RetryPolicy;
pub use store::OrderStore;
