use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    db_types::{Order, OrderId, OrderItem, OrderStatus, OrderWithOwner, PaymentMethod, PaymentStatus},
    traits::PaymentCredentials,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A customer's request to place an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
}

impl NewOrderRequest {
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self { items, payment_method: PaymentMethod::Stripe }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub order: Order,
    pub payment: PaymentCredentials,
}

/// Filter and paging parameters for the administrative order listing. Deserializes from
/// `?page=2&limit=10&status=SHIPPED&paymentStatus=PAID`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "status")]
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderQueryFilter {
    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn with_order_status(mut self, status: OrderStatus) -> Self {
        self.order_status = Some(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    /// True if no status filters are set. Paging does not count.
    pub fn is_empty(&self) -> bool {
        self.order_status.is_none() && self.payment_status.is_none()
    }

    /// The 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = i64::from(limit.max(1));
        let total_pages = (total + limit_i - 1) / limit_i;
        Self { page, limit, total, total_pages }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedOrders {
    pub data: Vec<OrderWithOwner>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub shipped: i64,
    pub delivered: i64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusSummary {
    pub id: OrderId,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for PaymentStatusSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            total_amount: order.total_amount,
            created_at: order.created_at,
        }
    }
}

/// What the webhook reconciler did with an authenticated event. Every variant is acknowledged to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// The order's payment status was set. `notified` is false if the owner was not connected.
    Applied { order_id: OrderId, payment_status: PaymentStatus, notified: bool },
    /// The event type is not one we act on.
    Ignored { event_type: String },
    /// No order carries the event's payment intent.
    Unmatched { intent_id: String },
}
