use shared::order::OrderStatus;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 订单核心错误
#[derive(Debug, Error)]
pub enum OrderError {
    /// 必填字段缺失或格式错误，在开启事务之前抛出
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid line item: {0}")]
    InvalidItem(String),

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Status transition not allowed: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// 临时错误：其他写入方抢到了分区，由 store 重试
    #[error("Daily sequence conflict")]
    SequenceConflict,

    /// `(tenant, day, seq)` 唯一约束拒绝了分配的号码。
    /// 分区计数器与 orders 表不一致，重试只会分到同一个号。
    #[error("Daily sequence already taken")]
    SequenceTaken,

    #[error("Daily sequence contention exceeded after {attempts} attempts")]
    ContentionExceeded { attempts: u32 },

    #[error("Order not found: {0}")]
    NotFound(i64),

    #[error("Persistence error: {0}")]
    Persistence(BoxError),
}

impl OrderError {
    pub fn persistence(msg: impl Into<String>) -> Self {
        OrderError::Persistence(msg.into().into())
    }
}

/// `(tenant_id, order_day, order_seq)` 唯一约束名
pub(crate) const DAILY_SEQ_CONSTRAINT: &str = "orders_daily_seq_unique";

/// 表示"其他事务先到一步"的 SQLSTATE
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            let code = db_err.code();
            let code = code.as_deref();
            if db_err.is_unique_violation() && db_err.constraint() == Some(DAILY_SEQ_CONSTRAINT) {
                tracing::error!(error = %db_err, "Daily sequence backstop violated");
                return OrderError::SequenceTaken;
            }
            if db_err.is_unique_violation()
                || code == Some(SERIALIZATION_FAILURE)
                || code == Some(DEADLOCK_DETECTED)
            {
                tracing::warn!(
                    error = %db_err,
                    constraint = db_err.constraint().unwrap_or_default(),
                    "Daily sequence conflict"
                );
                return OrderError::SequenceConflict;
            }
        }
        OrderError::Persistence(e.into())
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
