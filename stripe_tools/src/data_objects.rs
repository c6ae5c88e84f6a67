use std::collections::HashMap;

use opg_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StripeApiError;

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";

/// The parameters for opening a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentIntent {
    pub amount: Cents,
    pub currency: String,
    pub order_id: String,
    pub user_id: String,
}

impl NewPaymentIntent {
    pub fn new<S: Into<String>>(amount: Cents, currency: S, order_id: S, user_id: S) -> Self {
        Self { amount, currency: currency.into(), order_id: order_id.into(), user_id: user_id.into() }
    }

    /// Stripe's REST API only accepts form-encoded bodies. Metadata entries are flattened into `metadata[key]` fields.
    pub fn form_params(&self) -> Result<Vec<(String, String)>, StripeApiError> {
        if self.amount.value() <= 0 {
            return Err(StripeApiError::InvalidCurrencyAmount(format!(
                "Payment intents must be for a positive amount, not {}",
                self.amount
            )));
        }
        Ok(vec![
            ("amount".to_string(), self.amount.value().to_string()),
            ("currency".to_string(), self.currency.clone()),
            ("metadata[orderId]".to_string(), self.order_id.clone()),
            ("metadata[userId]".to_string(), self.user_id.clone()),
        ])
    }

    /// Every attempt to open an intent for the same order carries the same key, so Stripe will never create two
    /// intents for one order.
    pub fn idempotency_key(&self) -> String {
        format!("order-{}", self.order_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    pub object: Value,
}

impl StripeEvent {
    /// The id of the object the event is about. For `payment_intent.*` events this is the payment intent id.
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(Value::as_str)
    }
}
