//! # Order payment gateway server
//! This module hosts the server code for the order payment gateway. It is responsible for:
//! Accepting orders from authenticated customers and opening a Stripe payment intent for each.
//! Receiving signed webhook events from Stripe and reconciling them with the order ledger.
//! Pushing order updates to connected customers over a WebSocket.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/ws`: The realtime channel.
//! * `/api/payment/webhook/stripe`: The webhook route for Stripe events.
//! * `/api/...`: The order and administration API. All of these need a bearer token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod ws;
