use crate::{
    db::traits::OrderDbError,
    db_types::{NewOrder, Order, OrderId, OrderStatus, OrderWithOwner, PaymentStatus},
    order_objects::{OrderQueryFilter, OrderStats},
};

/// The `OrderManagement` trait defines the storage behaviour the order ledger needs from a database backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Persists a brand-new order with `PENDING` payment and order status and no payment intent.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderDbError>;

    /// Removes the order. Returns `false` if there was nothing to remove.
    async fn delete_order(&self, order_id: &OrderId) -> Result<bool, OrderDbError>;

    /// Stores the gateway's payment intent reference on the order.
    async fn attach_payment_intent(&self, order_id: &OrderId, intent_id: &str) -> Result<Order, OrderDbError>;

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderDbError>;

    /// Looks up the order whose stored payment intent reference equals `intent_id`.
    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, OrderDbError>;

    async fn fetch_order_with_owner(&self, order_id: &OrderId) -> Result<Option<OrderWithOwner>, OrderDbError>;

    /// All orders for the given owner, newest first.
    async fn fetch_orders_for_owner(&self, user_id: &str) -> Result<Vec<Order>, OrderDbError>;

    /// Sets the payment status in a single update. When the new status is `PAID` the order status is set to
    /// `PROCESSING` in the same statement.
    async fn update_payment_status(&self, order_id: &OrderId, status: PaymentStatus) -> Result<Order, OrderDbError>;

    /// Sets the fulfilment status. Returns `None` if the order does not exist.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, OrderDbError>;

    /// Returns the requested page of orders matching the filter, newest first, and the total number of matches.
    async fn search_orders(&self, query: &OrderQueryFilter) -> Result<(Vec<OrderWithOwner>, i64), OrderDbError>;

    async fn order_stats(&self) -> Result<OrderStats, OrderDbError>;
}
