//! A thin client for the parts of the Stripe API that the order payment gateway needs: opening payment intents and
//! authenticating incoming webhook events.
mod api;
mod config;
mod error;

mod data_objects;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    EventData,
    NewPaymentIntent,
    PaymentIntent,
    StripeEvent,
    PAYMENT_INTENT_FAILED,
    PAYMENT_INTENT_SUCCEEDED,
};
pub use error::StripeApiError;
