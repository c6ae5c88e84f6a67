use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{db_url, new_pool, orders, users};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatus, OrderWithOwner, PaymentStatus, User},
    order_objects::{OrderQueryFilter, OrderStats},
    traits::{OrderDbError, OrderManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `OPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, OrderDbError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    /// Opens (and if necessary creates) the database at `url` and brings its schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderDbError> {
        let pool = new_pool(url, max_connections).await?;
        migrate!("./src/db/sqlite/migrations")
            .run(&pool)
            .await
            .map_err(|e| OrderDbError::DriverError(format!("Could not run migrations. {e}")))?;
        debug!("🗃️ Database at {url} is ready");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), OrderDbError> {
        self.pool.close().await;
        Ok(())
    }

    pub async fn upsert_user(&self, user: &User) -> Result<(), OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        users::upsert_user(user, &mut conn).await
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<Option<User>, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        debug!("🗃️ Order {} has been saved in the DB", order.id);
        Ok(order)
    }

    async fn delete_order(&self, order_id: &OrderId) -> Result<bool, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::delete_order(order_id, &mut conn).await
    }

    async fn attach_payment_intent(&self, order_id: &OrderId, intent_id: &str) -> Result<Order, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::attach_payment_intent(order_id, intent_id, &mut conn).await
    }

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(order_id, &mut conn).await
    }

    async fn fetch_order_by_payment_intent(&self, intent_id: &str) -> Result<Option<Order>, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_payment_intent(intent_id, &mut conn).await
    }

    async fn fetch_order_with_owner(&self, order_id: &OrderId) -> Result<Option<OrderWithOwner>, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_with_owner(order_id, &mut conn).await
    }

    async fn fetch_orders_for_owner(&self, user_id: &str) -> Result<Vec<Order>, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_owner(user_id, &mut conn).await
    }

    async fn update_payment_status(&self, order_id: &OrderId, status: PaymentStatus) -> Result<Order, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_payment_status(order_id, status, &mut conn).await
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, status, &mut conn).await
    }

    async fn search_orders(&self, query: &OrderQueryFilter) -> Result<(Vec<OrderWithOwner>, i64), OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn order_stats(&self) -> Result<OrderStats, OrderDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::order_stats(&mut conn).await
    }
}
