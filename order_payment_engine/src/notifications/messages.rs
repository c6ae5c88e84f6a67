use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderStatus, PaymentStatus};

pub const CONNECTED_MESSAGE: &str = "Connected to real-time server";

/// The events pushed to connected users. On the wire these look like `{"event": "orderUpdate", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    #[serde(rename = "connected")]
    Connected(ConnectionAck),
    #[serde(rename = "orderUpdate")]
    OrderUpdate(OrderUpdate),
}

impl PushEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::OrderUpdate(_) => "orderUpdate",
        }
    }

    pub fn connected<S: Into<String>>(user_id: S) -> Self {
        Self::Connected(ConnectionAck {
            message: CONNECTED_MESSAGE.to_string(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
        })
    }

    pub fn order_update(order: &Order, message: &str) -> Self {
        Self::OrderUpdate(OrderUpdate::for_order(order, message))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionAck {
    pub message: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderUpdate {
    pub fn for_order(order: &Order, message: &str) -> Self {
        Self {
            order_id: order.id.clone(),
            order_status: order.order_status,
            payment_status: order.payment_status,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// The message sent to the owner when the gateway reports a payment outcome.
pub fn payment_status_message(status: PaymentStatus) -> Option<&'static str> {
    match status {
        PaymentStatus::Paid => Some("💰 Payment successful! Your order is now being processed."),
        PaymentStatus::Failed => Some("❌ Payment failed. Please try again or contact support."),
        PaymentStatus::Pending => None,
    }
}

/// The message sent to the owner when an administrator changes the order status.
pub fn order_status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "⏳ Your order is pending.",
        OrderStatus::Processing => "🔄 Your order is being processed.",
        OrderStatus::Shipped => "🚚 Your order has been shipped!",
        OrderStatus::Delivered => "✅ Your order has been delivered!",
    }
}
