//! # Database backend contracts
//!
//! The engine never touches a database directly. Backends implement [`OrderManagement`] and the public API structs
//! ([`crate::OrderFlowApi`], [`crate::AdminApi`], [`crate::PaymentWebhookApi`]) are generic over it.
//!
//! Payment fields of an order are only ever written through [`OrderManagement::update_payment_status`], which is
//! called exclusively by the webhook reconciler.
mod errors;
mod order_management;

pub use errors::OrderDbError;
pub use order_management::OrderManagement;
