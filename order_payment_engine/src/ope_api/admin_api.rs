use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderId, OrderStatus, OrderWithOwner},
    notifications::{order_status_message, PushEvent},
    order_objects::{OrderQueryFilter, OrderStats, PaginatedOrders, Pagination, PaymentStatusSummary},
    traits::{Notifier, OrderManagement},
    OrderFlowError,
};

/// Administrative access to the order ledger: unrestricted reads, fulfilment status changes, statistics and purges.
///
/// None of these paths touch payment status.
pub struct AdminApi<B, N> {
    db: B,
    notifier: N,
}

impl<B, N> Debug for AdminApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi")
    }
}

impl<B, N> AdminApi<B, N> {
    pub fn new(db: B, notifier: N) -> Self {
        Self { db, notifier }
    }
}

impl<B, N> AdminApi<B, N>
where
    B: OrderManagement,
    N: Notifier,
{
    pub async fn order_by_id(&self, order_id: &OrderId) -> Result<OrderWithOwner, OrderFlowError> {
        self.db.fetch_order_with_owner(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.to_string()))
    }

    /// Sets the fulfilment status of the order, whatever its payment status, and lets the owner know.
    pub async fn update_order_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .update_order_status(order_id, status)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.to_string()))?;
        info!("🔄️📦️ Order {order_id} status set to {status}");
        let event = PushEvent::order_update(&order, order_status_message(status));
        if !self.notifier.notify_user(&order.user_id, event) {
            debug!("🔄️📦️ Owner of order {order_id} was not notified of the status change");
        }
        Ok(order)
    }

    pub async fn list_orders(&self, query: &OrderQueryFilter) -> Result<PaginatedOrders, OrderFlowError> {
        let (data, total) = self.db.search_orders(query).await?;
        let pagination = Pagination::new(query.page(), query.limit(), total);
        Ok(PaginatedOrders { data, pagination })
    }

    pub async fn order_stats(&self) -> Result<OrderStats, OrderFlowError> {
        Ok(self.db.order_stats().await?)
    }

    /// Permanently removes the order.
    pub async fn delete_order(&self, order_id: &OrderId) -> Result<(), OrderFlowError> {
        if self.db.fetch_order_by_id(order_id).await?.is_none() {
            return Err(OrderFlowError::OrderNotFound(order_id.to_string()));
        }
        if !self.db.delete_order(order_id).await? {
            return Err(OrderFlowError::OrderNotFound(order_id.to_string()));
        }
        warn!("🔄️📦️ Order {order_id} was deleted by an administrator");
        Ok(())
    }

    pub async fn payment_status(&self, order_id: &OrderId) -> Result<PaymentStatusSummary, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_id(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.to_string()))?;
        Ok(PaymentStatusSummary::from(&order))
    }
}
