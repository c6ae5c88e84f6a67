use thiserror::Error;

use crate::db_types::OrderId;

#[derive(Debug, Clone, Error)]
pub enum OrderDbError {
    #[error("Database driver error: {0}")]
    DriverError(String),
    #[error("Could not encode or decode a record: {0}")]
    SerializationError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert duplicate order {0}")]
    DuplicateOrder(OrderId),
}

impl From<sqlx::Error> for OrderDbError {
    fn from(e: sqlx::Error) -> Self {
        Self::DriverError(e.to_string())
    }
}

impl From<serde_json::Error> for OrderDbError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
