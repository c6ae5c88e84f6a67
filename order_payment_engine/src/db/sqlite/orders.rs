use chrono::Utc;
use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatus, OrderWithOwner, OwnerSummary, PaymentStatus},
    order_objects::{OrderQueryFilter, OrderStats},
    traits::OrderDbError,
};

const ORDER_WITH_OWNER_SELECT: &str = r#"
    SELECT
        orders.*,
        users.id AS owner_id,
        users.name AS owner_name,
        users.email AS owner_email
    FROM orders
    LEFT JOIN users ON users.id = orders.user_id
    "#;

#[derive(FromRow)]
struct OrderOwnerRow {
    #[sqlx(flatten)]
    order: Order,
    owner_id: Option<String>,
    owner_name: Option<String>,
    owner_email: Option<String>,
}

impl From<OrderOwnerRow> for OrderWithOwner {
    fn from(row: OrderOwnerRow) -> Self {
        let user = match (row.owner_id, row.owner_name, row.owner_email) {
            (Some(id), Some(name), Some(email)) => Some(OwnerSummary { id, name, email }),
            _ => None,
        };
        Self { order: row.order, user }
    }
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderDbError> {
    let items = order.items.to_json()?;
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                user_id,
                items,
                total_amount,
                payment_method,
                payment_status,
                order_status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'PENDING', 'PENDING', $6, $6)
            RETURNING *;
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(items)
    .bind(order.total_amount)
    .bind(order.payment_method)
    .bind(order.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(OrderDbError::DuplicateOrder(order.id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, OrderDbError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn attach_payment_intent(
    order_id: &OrderId,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderDbError> {
    let order = sqlx::query_as(
        "UPDATE orders SET payment_intent_id = $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(intent_id)
    .bind(Utc::now())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    order.ok_or_else(|| OrderDbError::OrderNotFound(order_id.clone()))
}

pub async fn fetch_order_by_id(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, OrderDbError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_intent(
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderDbError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_intent_id = $1")
        .bind(intent_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_with_owner(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderWithOwner>, OrderDbError> {
    let sql = format!("{ORDER_WITH_OWNER_SELECT} WHERE orders.id = $1");
    let row: Option<OrderOwnerRow> = sqlx::query_as(&sql).bind(order_id).fetch_optional(conn).await?;
    Ok(row.map(OrderWithOwner::from))
}

pub async fn fetch_orders_for_owner(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderDbError> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Sets the payment status of the order. A `PAID` status also sets the order status to `PROCESSING` within the same
/// statement, whatever it was before. Any other payment status leaves the order status alone.
pub async fn update_payment_status(
    order_id: &OrderId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderDbError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = $1,
                order_status = CASE
                    WHEN $2 = 'PAID' THEN 'PROCESSING'
                    ELSE order_status
                END,
                updated_at = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(status.to_string())
    .bind(Utc::now())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Payment status for order {order_id} set to {status}");
    order.ok_or_else(|| OrderDbError::OrderNotFound(order_id.clone()))
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderDbError> {
    let order = sqlx::query_as("UPDATE orders SET order_status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(status)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(status) = query.order_status {
        where_clause.push("orders.order_status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(status) = query.payment_status {
        where_clause.push("orders.payment_status = ");
        where_clause.push_bind_unseparated(status);
    }
}

pub async fn search_orders(
    query: &OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<(Vec<OrderWithOwner>, i64), OrderDbError> {
    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut count_builder, query);
    let (total,): (i64,) = count_builder.build_query_as().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new(ORDER_WITH_OWNER_SELECT);
    push_filters(&mut builder, query);
    builder.push(" ORDER BY orders.created_at DESC, orders.rowid DESC LIMIT ");
    builder.push_bind(i64::from(query.limit()));
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows: Vec<OrderOwnerRow> = builder.build_query_as().fetch_all(&mut *conn).await?;
    trace!("🗃️ Order search returned {} of {total} orders", rows.len());
    Ok((rows.into_iter().map(OrderWithOwner::from).collect(), total))
}

pub async fn order_stats(conn: &mut SqliteConnection) -> Result<OrderStats, OrderDbError> {
    let stats = sqlx::query_as(
        r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN order_status = 'PENDING' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN order_status = 'PROCESSING' THEN 1 ELSE 0 END), 0) AS processing,
                COALESCE(SUM(CASE WHEN order_status = 'SHIPPED' THEN 1 ELSE 0 END), 0) AS shipped,
                COALESCE(SUM(CASE WHEN order_status = 'DELIVERED' THEN 1 ELSE 0 END), 0) AS delivered,
                CAST(COALESCE(SUM(CASE WHEN payment_status = 'PAID' THEN total_amount ELSE 0 END), 0) AS REAL)
                    AS total_revenue
            FROM orders;
        "#,
    )
    .fetch_one(conn)
    .await?;
    Ok(stats)
}
