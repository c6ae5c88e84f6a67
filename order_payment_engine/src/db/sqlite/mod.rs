//! SQLite backend for the order payment engine.
//!
//! The query functions in [`orders`] and [`users`] take a `&mut SqliteConnection` so that they can be composed inside a
//! transaction (pass `&mut *tx`) or run on a plain pooled connection. [`SqliteDatabase`] wires them up to the
//! [`crate::traits::OrderManagement`] contract.
pub mod orders;
pub mod users;

mod sqlite_impl;

use std::{env, str::FromStr};

use log::info;
pub use sqlite_impl::SqliteDatabase;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::OrderDbError;

const SQLITE_DB_URL: &str = "sqlite://data/orders.db";

pub fn db_url() -> String {
    let result = env::var("OPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ OPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, OrderDbError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
