use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------     OrderId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// A fresh, random order id.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

//--------------------------------------   Status enums    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status value: {0}")]
pub struct StatusConversionError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// The order is waiting for the gateway to report a payment outcome.
    Pending,
    /// The gateway reported a successful payment.
    Paid,
    /// The gateway reported a failed payment.
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [Self::Pending, Self::Processing, Self::Shipped, Self::Delivered];
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Shipped => write!(f, "SHIPPED"),
            Self::Delivered => write!(f, "DELIVERED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

/// The payment gateway an order is paid through. Stripe is the only one at present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "STRIPE", alias = "stripe")]
    Stripe,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stripe => write!(f, "STRIPE"),
        }
    }
}

//--------------------------------------     OrderItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub title: String,
    pub price: f64,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new<S: Into<String>>(title: S, price: f64, quantity: u32) -> Self {
        Self { title: title.into(), price, quantity }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// The line items of an order. Stored as a JSON array in a single text column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItems(pub Vec<OrderItem>);

impl OrderItems {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderItem> {
        self.0.iter()
    }

    /// Σ price × quantity over all items.
    pub fn total(&self) -> f64 {
        self.0.iter().map(OrderItem::line_total).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<Vec<OrderItem>> for OrderItems {
    fn from(items: Vec<OrderItem>) -> Self {
        Self(items)
    }
}

impl TryFrom<String> for OrderItems {
    type Error = serde_json::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_json::from_str(&value).map(Self)
    }
}

//--------------------------------------       Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub items: OrderItems,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: String,
    pub items: OrderItems,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A new order with a random id and the total computed from `items`.
    pub fn new<S: Into<String>>(user_id: S, items: OrderItems, payment_method: PaymentMethod) -> Self {
        let total_amount = items.total();
        Self {
            id: OrderId::random(),
            user_id: user_id.into(),
            items,
            total_amount,
            payment_method,
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------   Users & owners   ---------------------------------------------------------
/// A customer or administrator. User records belong to the account service. The engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// The owner details included in administrative order views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithOwner {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<OwnerSummary>,
}
