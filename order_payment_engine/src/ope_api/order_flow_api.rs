use std::fmt::Debug;

use log::*;
use opg_common::Cents;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderItems},
    order_objects::{CreateOrderResult, NewOrderRequest},
    traits::{OrderManagement, PaymentGateway},
    OrderFlowError,
};

/// The most line items a single order may carry.
pub const DEFAULT_MAX_ITEMS_PER_ORDER: usize = 50;

/// `OrderFlowApi` is the customer-facing side of the order ledger: placing orders and reading your own orders.
///
/// Placing an order persists it and then opens a payment intent with the gateway before returning. If the gateway
/// call fails, the order is removed again so that no order is left behind without a way to pay for it.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    max_items: usize,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (max {} items)", self.max_items)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, max_items: DEFAULT_MAX_ITEMS_PER_ORDER }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    /// Validates and stores a new order for `owner_id` and opens a payment intent for its total.
    ///
    /// Errors:
    /// * [`OrderFlowError::InvalidOrder`] if the items are empty, too many, individually invalid, or add up to less than one cent.
    /// * [`OrderFlowError::GatewayUnavailable`] if the payment intent could not be opened. The order is rolled back.
    pub async fn create_order(
        &self,
        owner_id: &str,
        request: NewOrderRequest,
    ) -> Result<CreateOrderResult, OrderFlowError> {
        validate_order_items(&request.items, self.max_items)?;
        let items = OrderItems::from(request.items);
        let new_order = NewOrder::new(owner_id, items, request.payment_method);
        if !new_order.total_amount.is_finite() || new_order.total_amount <= 0.0 {
            return Err(OrderFlowError::InvalidOrder("Invalid order total amount".into()));
        }
        let amount = Cents::from_decimal(new_order.total_amount)
            .map_err(|e| OrderFlowError::InvalidOrder(format!("Invalid order total amount. {e}")))?;
        if amount.value() <= 0 {
            return Err(OrderFlowError::InvalidOrder(format!("Order total {amount} is less than one cent")));
        }
        let order = self.db.insert_order(new_order).await?;
        debug!("🔄️📦️ Order {} for {owner_id} created. Total {}", order.id, amount);
        let payment = match self.gateway.create_intent(&order.id, amount, owner_id).await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("🔄️📦️ Could not open a payment intent for order {}. Rolling the order back. {e}", order.id);
                match self.db.delete_order(&order.id).await {
                    Ok(_) => debug!("🔄️📦️ Order {} rolled back", order.id),
                    Err(db_err) => error!(
                        "🔄️📦️ Order {} could not be rolled back and remains without a payment intent. {db_err}",
                        order.id
                    ),
                }
                return Err(e.into());
            },
        };
        let order = self.db.attach_payment_intent(&order.id, &payment.payment_intent_id).await?;
        info!("🔄️📦️ Order {} is awaiting payment on intent {}", order.id, payment.payment_intent_id);
        Ok(CreateOrderResult { order, payment })
    }
}

impl<B, G> OrderFlowApi<B, G>
where B: OrderManagement
{
    /// All of the caller's orders, newest first.
    pub async fn orders_for_owner(&self, owner_id: &str) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_owner(owner_id).await?;
        trace!("🔄️📦️ Fetched {} orders for {owner_id}", orders.len());
        Ok(orders)
    }

    /// Fetches the order if it belongs to `owner_id`. Someone else's order is reported as not found.
    pub async fn order_for_owner(&self, order_id: &OrderId, owner_id: &str) -> Result<Order, OrderFlowError> {
        match self.db.fetch_order_by_id(order_id).await? {
            Some(order) if order.user_id == owner_id => Ok(order),
            Some(_) => {
                debug!("🔄️📦️ {owner_id} asked for order {order_id}, which belongs to someone else");
                Err(OrderFlowError::OrderNotFound(order_id.to_string()))
            },
            None => Err(OrderFlowError::OrderNotFound(order_id.to_string())),
        }
    }
}

/// Checks the item list of a new order: 1 to `max_items` items, each with a title, a positive price and a positive
/// quantity.
pub fn validate_order_items(items: &[OrderItem], max_items: usize) -> Result<(), OrderFlowError> {
    if items.is_empty() {
        return Err(OrderFlowError::InvalidOrder("An order must contain at least one item".into()));
    }
    if items.len() > max_items {
        return Err(OrderFlowError::InvalidOrder(format!(
            "An order may contain at most {max_items} items, not {}",
            items.len()
        )));
    }
    for (i, item) in items.iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(OrderFlowError::InvalidOrder(format!("Item {} has no title", i + 1)));
        }
        if !item.price.is_finite() || item.price <= 0.0 {
            return Err(OrderFlowError::InvalidOrder(format!("Item '{}' must have a positive price", item.title)));
        }
        if item.quantity == 0 {
            return Err(OrderFlowError::InvalidOrder(format!("Item '{}' must have a positive quantity", item.title)));
        }
    }
    Ok(())
}
