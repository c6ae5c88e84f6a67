use opg_common::Cents;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderId, PaymentStatus};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached or refused the request. {0}")]
    Unavailable(String),
    #[error("The event signature could not be verified. {0}")]
    SignatureInvalid(String),
    #[error("The event payload is not a valid gateway event. {0}")]
    MalformedEvent(String),
}

/// What the client needs to complete the payment with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCredentials {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// An authenticated webhook event, reduced to what the reconciler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    PaymentSucceeded { event_id: String, intent_id: String },
    PaymentFailed { event_id: String, intent_id: String },
    /// Any event type we don't act on. These are acknowledged so that the gateway stops re-delivering them.
    Unrecognized { event_id: String, event_type: String },
}

impl GatewayEvent {
    pub fn event_id(&self) -> &str {
        match self {
            Self::PaymentSucceeded { event_id, .. } |
            Self::PaymentFailed { event_id, .. } |
            Self::Unrecognized { event_id, .. } => event_id.as_str(),
        }
    }

    /// The payment intent the event refers to and the payment status it moves the order to. `None` for events that
    /// are not acted upon.
    pub fn payment_transition(&self) -> Option<(&str, PaymentStatus)> {
        match self {
            Self::PaymentSucceeded { intent_id, .. } => Some((intent_id.as_str(), PaymentStatus::Paid)),
            Self::PaymentFailed { intent_id, .. } => Some((intent_id.as_str(), PaymentStatus::Failed)),
            Self::Unrecognized { .. } => None,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Opens a payment intent for `amount` with the gateway. The order and owner ids are attached as metadata.
    async fn create_intent(
        &self,
        order_id: &OrderId,
        amount: Cents,
        owner_id: &str,
    ) -> Result<PaymentCredentials, GatewayError>;

    /// Authenticates a raw webhook payload against its signature header and classifies it.
    ///
    /// `payload` must be the request body exactly as received.
    fn construct_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError>;
}
