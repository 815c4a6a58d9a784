//! 订单核心错误到 API 层 `AppError` 的映射
//!
//! `OrderError` 表达业务含义，`AppError` 负责数字错误码和 HTTP 状态。
//! handler 返回 `ApiResult`，对 store 调用直接用 `?`。

use shared::error::{AppError, ErrorCode};

use crate::orders::OrderError;

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::InvalidItem(msg) => {
                AppError::with_message(ErrorCode::OrderItemInvalid, msg)
            }
            OrderError::InvalidPaymentMethod(raw) => AppError::with_message(
                ErrorCode::PaymentInvalidMethod,
                format!("Invalid payment method: {raw}"),
            )
            .with_detail("payment", raw),
            OrderError::InvalidStatus(raw) => AppError::with_message(
                ErrorCode::OrderInvalidStatus,
                format!("Invalid status: {raw}"),
            )
            .with_detail("status", raw),
            OrderError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::OrderInvalidTransition,
                format!("Status transition not allowed: {from} -> {to}"),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            // 只有冲突逃出重试循环时才会走到这里
            OrderError::SequenceConflict => AppError::new(ErrorCode::OrderSequenceContention),
            OrderError::SequenceTaken => AppError::new(ErrorCode::OrderSequenceDuplicate),
            OrderError::ContentionExceeded { attempts } => {
                AppError::new(ErrorCode::OrderSequenceContention).with_detail("attempts", attempts)
            }
            OrderError::NotFound(id) => AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {id} not found"),
            ),
            OrderError::Persistence(err) => {
                tracing::error!(error = %err, "Order persistence error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}
