//! Order Payment Engine
//!
//! The core of the order payment gateway: customers place orders, an external payment gateway takes the money
//! asynchronously, and the engine reconciles the gateway's verdict with its own order records before pushing the
//! outcome to the customer in real time. It is provider-agnostic.
//!
//! The library is divided into these sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. You should never need to access the database
//!    directly. The data types used in the database are defined in [`db_types`] and are public.
//! 2. The public API ([`OrderFlowApi`], [`AdminApi`], [`PaymentWebhookApi`]). These are generic over the [`traits`]
//!    that storage backends, payment gateways and notifiers implement.
//! 3. Realtime notifications ([`notifications`]): the registry of connected users and the events pushed to them.
mod db;

pub mod db_types;
pub mod notifications;
mod ope_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use notifications::ConnectionRegistry;
pub use ope_api::{
    admin_api::AdminApi,
    errors::OrderFlowError,
    order_flow_api::{validate_order_items, OrderFlowApi, DEFAULT_MAX_ITEMS_PER_ORDER},
    order_objects,
    webhook_api::PaymentWebhookApi,
};
