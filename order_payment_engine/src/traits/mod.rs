//! The seams of the engine.
//!
//! * [`OrderManagement`] is implemented by storage backends.
//! * [`PaymentGateway`] is implemented by payment provider adapters (see the Stripe integration in the server).
//! * [`Notifier`] delivers realtime events to connected users. [`crate::notifications::ConnectionRegistry`] is the
//!   in-process implementation. A shared broker can stand in for it when running more than one server process.
mod notifier;
mod payment_gateway;

pub use notifier::Notifier;
pub use payment_gateway::{GatewayError, GatewayEvent, PaymentCredentials, PaymentGateway};

pub use crate::db::traits::{OrderDbError, OrderManagement};
