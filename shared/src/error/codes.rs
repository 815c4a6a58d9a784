//! Unified error codes for the order cloud
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Tenant errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 3xxx: Tenant ====================
    /// Tenant not selected (principal carries no company)
    TenantNotSelected = 3001,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Line item rejected (price, quantity or discount out of bounds)
    OrderItemInvalid = 4008,
    /// Status value outside the known state set
    OrderInvalidStatus = 4010,
    /// Status change not allowed by the lifecycle
    OrderInvalidTransition = 4011,
    /// Daily sequence allocation gave up after repeated conflicts
    OrderSequenceContention = 4020,
    /// Daily sequence already taken in the partition
    OrderSequenceDuplicate = 4021,

    // ==================== 5xxx: Payment ====================
    /// Invalid payment method
    PaymentInvalidMethod = 5003,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// Resource limit exceeded (connections, subscribers)
    ResourceLimitExceeded = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Tenant
            ErrorCode::TenantNotSelected => "No tenant selected",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderItemInvalid => "Order item is invalid",
            ErrorCode::OrderInvalidStatus => "Invalid order status",
            ErrorCode::OrderInvalidTransition => "Order status transition not allowed",
            ErrorCode::OrderSequenceContention => {
                "Order numbering is busy, please retry the request"
            }
            ErrorCode::OrderSequenceDuplicate => "Order number already assigned",

            // Payment
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",

            // System
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ResourceLimitExceeded => "Resource limit exceeded",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Tenant
            3001 => Ok(ErrorCode::TenantNotSelected),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4008 => Ok(ErrorCode::OrderItemInvalid),
            4010 => Ok(ErrorCode::OrderInvalidStatus),
            4011 => Ok(ErrorCode::OrderInvalidTransition),
            4020 => Ok(ErrorCode::OrderSequenceContention),
            4021 => Ok(ErrorCode::OrderSequenceDuplicate),

            // Payment
            5003 => Ok(ErrorCode::PaymentInvalidMethod),

            // System
            9002 => Ok(ErrorCode::DatabaseError),
            9006 => Ok(ErrorCode::ResourceLimitExceeded),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
