use log::*;
use opg_common::Cents;
use order_payment_engine::{
    db_types::OrderId,
    traits::{GatewayError, GatewayEvent, PaymentCredentials, PaymentGateway},
};
use stripe_tools::{NewPaymentIntent, StripeApi, StripeEvent, PAYMENT_INTENT_FAILED, PAYMENT_INTENT_SUCCEEDED};

/// The Stripe implementation of [`PaymentGateway`].
#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(api: StripeApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        order_id: &OrderId,
        amount: Cents,
        owner_id: &str,
    ) -> Result<PaymentCredentials, GatewayError> {
        let currency = self.api.config().currency.clone();
        let intent = NewPaymentIntent::new(amount, currency, order_id.to_string(), owner_id.to_string());
        let intent = self.api.create_payment_intent(&intent).await.map_err(|e| {
            error!("💳️ Stripe could not open a payment intent for order {order_id}. {e}");
            GatewayError::Unavailable(e.to_string())
        })?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            GatewayError::Unavailable(format!("Stripe returned payment intent {} without a client secret", intent.id))
        })?;
        Ok(PaymentCredentials { client_secret, payment_intent_id: intent.id })
    }

    fn construct_event(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, GatewayError> {
        let event = self.api.construct_event(payload, signature).map_err(|e| {
            if e.is_signature_error() {
                GatewayError::SignatureInvalid(e.to_string())
            } else {
                GatewayError::MalformedEvent(e.to_string())
            }
        })?;
        debug!("💳️ Received Stripe event {} ({})", event.id, event.event_type);
        classify_event(event)
    }
}

/// Maps an authenticated Stripe event onto the events the reconciler understands.
pub fn classify_event(event: StripeEvent) -> Result<GatewayEvent, GatewayError> {
    let intent_id = event.object_id().map(String::from);
    let StripeEvent { id: event_id, event_type, .. } = event;
    match (event_type.as_str(), intent_id) {
        (PAYMENT_INTENT_SUCCEEDED, Some(intent_id)) => Ok(GatewayEvent::PaymentSucceeded { event_id, intent_id }),
        (PAYMENT_INTENT_FAILED, Some(intent_id)) => Ok(GatewayEvent::PaymentFailed { event_id, intent_id }),
        (PAYMENT_INTENT_SUCCEEDED | PAYMENT_INTENT_FAILED, None) => {
            Err(GatewayError::MalformedEvent(format!("Event {event_id} ({event_type}) has no payment intent id")))
        },
        _ => Ok(GatewayEvent::Unrecognized { event_id, event_type: event_type.clone() }),
    }
}
