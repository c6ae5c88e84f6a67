use std::fmt::Display;

use order_payment_engine::db_types::OrderStatus;
use serde::{Deserialize, Serialize};

/// The envelope for every successful API response: `{"success": true, "message": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResponse<T> {
    pub fn success<S: Display>(message: S, data: T) -> Self {
        Self { success: true, message: message.to_string(), data: Some(data) }
    }
}

impl JsonResponse<()> {
    pub fn message<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string(), data: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub order_status: OrderStatus,
}

/// The acknowledgement returned to the payment gateway for every webhook delivery that was accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl Default for WebhookAck {
    fn default() -> Self {
        Self { received: true }
    }
}
