//! The public API of the order payment engine.
//!
//! * [`order_flow_api::OrderFlowApi`]: placing orders and reading your own orders.
//! * [`admin_api::AdminApi`]: administrative reads, fulfilment updates, statistics and purges.
//! * [`webhook_api::PaymentWebhookApi`]: reconciliation of gateway payment events.
pub mod admin_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod webhook_api;
