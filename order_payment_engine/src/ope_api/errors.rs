use thiserror::Error;

use crate::traits::{GatewayError, OrderDbError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error("Order not found")]
    OrderNotFound(String),
    #[error("Webhook signature verification failed. {0}")]
    SignatureInvalid(String),
    #[error("Webhook payload could not be decoded. {0}")]
    MalformedEvent(String),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("Database error. {0}")]
    DatabaseError(String),
}

impl From<OrderDbError> for OrderFlowError {
    fn from(e: OrderDbError) -> Self {
        match e {
            OrderDbError::OrderNotFound(id) => Self::OrderNotFound(id.to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<GatewayError> for OrderFlowError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unavailable(s) => Self::GatewayUnavailable(s),
            GatewayError::SignatureInvalid(s) => Self::SignatureInvalid(s),
            GatewayError::MalformedEvent(s) => Self::MalformedEvent(s),
        }
    }
}
