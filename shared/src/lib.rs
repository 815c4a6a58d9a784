//! Shared types for the order cloud
//!
//! Wire types and the unified error system used by the server and by any
//! Rust client of its API.

pub mod error;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
