use std::fmt::Debug;

use log::*;

use crate::{
    notifications::{payment_status_message, PushEvent},
    order_objects::WebhookOutcome,
    traits::{GatewayEvent, Notifier, OrderManagement, PaymentGateway},
    OrderFlowError,
};

/// `PaymentWebhookApi` reconciles payment outcomes reported by the gateway with the order ledger.
///
/// Gateways deliver events at least once and in no particular order. Each event is handled as:
/// 1. verify the signature over the raw body (nothing is touched if that fails),
/// 2. classify the event (anything that is not a success or failure is acknowledged and ignored),
/// 3. find the order by payment intent id (no match is acknowledged and ignored),
/// 4. write the new payment status in a single update,
/// 5. tell the owner, if they are connected.
///
/// Step 4 is idempotent by value: delivering the same event twice leaves the order in the same state. There is no
/// event de-duplication ledger. A success and a failure for the same intent racing each other resolve as last write
/// wins.
pub struct PaymentWebhookApi<B, G, N> {
    db: B,
    gateway: G,
    notifier: N,
}

impl<B, G, N> Debug for PaymentWebhookApi<B, G, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentWebhookApi")
    }
}

impl<B, G, N> PaymentWebhookApi<B, G, N> {
    pub fn new(db: B, gateway: G, notifier: N) -> Self {
        Self { db, gateway, notifier }
    }
}

impl<B, G, N> PaymentWebhookApi<B, G, N>
where
    B: OrderManagement,
    G: PaymentGateway,
    N: Notifier,
{
    /// Processes one webhook delivery. `payload` must be the request body exactly as it arrived.
    ///
    /// Returns an error only for signature failures, undecodable payloads, and storage failures. The first two are
    /// the sender's problem. The last is worth a retry by the gateway because the update is idempotent.
    pub async fn handle_event(&self, signature: &str, payload: &[u8]) -> Result<WebhookOutcome, OrderFlowError> {
        let event = self.gateway.construct_event(payload, signature).map_err(|e| {
            warn!("🔐️ Rejected webhook delivery. {e}");
            OrderFlowError::from(e)
        })?;
        let Some((intent_id, status)) = event.payment_transition() else {
            let event_type = match &event {
                GatewayEvent::Unrecognized { event_type, .. } => event_type.clone(),
                _ => String::default(),
            };
            warn!("💳️ Unhandled event type {event_type} ({}). Acknowledging it anyway", event.event_id());
            return Ok(WebhookOutcome::Ignored { event_type });
        };
        let order = match self.db.fetch_order_by_payment_intent(intent_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                error!("💳️ Event {} refers to payment intent {intent_id}, which matches no order", event.event_id());
                return Ok(WebhookOutcome::Unmatched { intent_id: intent_id.to_string() });
            },
            Err(e) => {
                error!("💳️ Could not look up the order for payment intent {intent_id}. {e}");
                return Err(e.into());
            },
        };
        let order = self.db.update_payment_status(&order.id, status).await.map_err(|e| {
            error!("💳️ Could not set payment status of order {} to {status}. {e}", order.id);
            OrderFlowError::from(e)
        })?;
        info!("💳️ Order {} payment status is now {status} (order status {})", order.id, order.order_status);
        let notified = match payment_status_message(status) {
            Some(message) => self.notifier.notify_user(&order.user_id, PushEvent::order_update(&order, message)),
            None => false,
        };
        Ok(WebhookOutcome::Applied { order_id: order.id, payment_status: status, notified })
    }
}
