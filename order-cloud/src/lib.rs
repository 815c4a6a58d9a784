//! order-cloud: 多租户订单后端
//!
//! - 按租户、按营业日为每个订单分配流水号
//! - 订单与编号原子落库
//! - 提交后向租户订阅者推送变更事件
//! - 提供租户订单 API（JWT 认证）和 WebSocket 推送

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod orders;
pub mod state;

pub use config::Config;
pub use state::AppState;
