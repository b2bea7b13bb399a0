//! Order Repository
//!
//! Orders are created once at checkout (order + items in one transaction)
//! and mutated only by lifecycle transitions. Order numbers come from a
//! durable per-year counter bumped in the same transaction as the insert,
//! so concurrent checkouts can never derive the same sequence.

use super::{RepoError, RepoResult};
use crate::db::models::{Order, OrderCreate, OrderDetail, OrderItem, OrderItemCreate, OrderStatus};
use crate::utils::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, order_number, customer_id, customer_name, customer_email, \
    shipping_address_id, status, subtotal_amount, shipping_amount, discount_amount, total_amount, \
    payment_method, created_at, paid_at, shipped_at, delivered_at, canceled_at FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, product_id, product_name, quantity, unit_price, \
    discount_amount FROM order_item";

/// Format a human-facing order number, e.g. `PED-2025-000123`
pub fn format_order_number(year: i32, seq: i64) -> String {
    format!("PED-{year}-{seq:06}")
}

/// Derive the next order number for `year` from the counter table.
///
/// `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` bumps the counter under
/// the caller's transaction; the UNIQUE constraint on `orders.order_number`
/// stays as defense in depth.
pub async fn next_order_number(conn: &mut SqliteConnection, year: i32) -> RepoResult<String> {
    let seq = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_sequence (year, last_seq) VALUES (?1, 1) \
         ON CONFLICT (year) DO UPDATE SET last_seq = last_seq + 1 \
         RETURNING last_seq",
    )
    .bind(year)
    .fetch_one(&mut *conn)
    .await?;
    Ok(format_order_number(year, seq))
}

/// Insert the order and all its items in the caller's transaction
pub async fn create(
    conn: &mut SqliteConnection,
    order_number: &str,
    data: OrderCreate,
    items: &[OrderItemCreate],
) -> RepoResult<Order> {
    let now = now_millis();
    let order_id = snowflake_id();
    sqlx::query(
        "INSERT INTO orders (id, order_number, customer_id, customer_name, customer_email, \
                             shipping_address_id, status, subtotal_amount, shipping_amount, \
                             discount_amount, total_amount, payment_method, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(order_id)
    .bind(order_number)
    .bind(data.customer_id)
    .bind(&data.customer_name)
    .bind(&data.customer_email)
    .bind(data.shipping_address_id)
    .bind(OrderStatus::Pending)
    .bind(data.subtotal_amount)
    .bind(data.shipping_amount)
    .bind(data.discount_amount)
    .bind(data.total_amount)
    .bind(&data.payment_method)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_item (id, order_id, product_id, product_name, quantity, \
                                     unit_price, discount_amount) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(snowflake_id())
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.discount_amount)
        .execute(&mut *conn)
        .await?;
    }

    find_by_id(conn, order_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Items of an order (creation order)
pub async fn items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// An order item joined with the product's current stock, for the
/// confirmation-time re-check
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemStock {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub stock: i64,
}

pub async fn items_with_stock(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<ItemStock>> {
    let rows = sqlx::query_as::<_, ItemStock>(
        "SELECT oi.product_id, oi.product_name, oi.quantity, p.stock \
         FROM order_item oi JOIN product p ON oi.product_id = p.id \
         WHERE oi.order_id = ? ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Transition `PENDING → PAYMENT_CONFIRMED`, setting `paid_at`.
///
/// Guarded on the current status: returns false when another writer
/// already moved the order on, leaving the row untouched.
pub async fn mark_paid(conn: &mut SqliteConnection, order_id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, paid_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(OrderStatus::PaymentConfirmed)
    .bind(now)
    .bind(order_id)
    .bind(OrderStatus::Pending)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Full order detail (order + items + shipping address) for the
/// confirmation page
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let mut conn = pool.acquire().await?;
    let Some(order) = find_by_id(&mut conn, id).await? else {
        return Ok(None);
    };
    let items = items(&mut conn, order.id).await?;
    let shipping_address = super::address::find_by_id(&mut conn, order.shipping_address_id).await?;
    Ok(Some(OrderDetail {
        order,
        items,
        shipping_address,
    }))
}

/// Full order detail looked up by the human-facing order number
pub async fn find_detail_by_number(
    pool: &SqlitePool,
    order_number: &str,
) -> RepoResult<Option<OrderDetail>> {
    let sql = format!("{ORDER_SELECT} WHERE order_number = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_number)
        .fetch_optional(pool)
        .await?;
    let Some(order) = order else {
        return Ok(None);
    };
    let mut conn = pool.acquire().await?;
    let items = items(&mut conn, order.id).await?;
    let shipping_address = super::address::find_by_id(&mut conn, order.shipping_address_id).await?;
    Ok(Some(OrderDetail {
        order,
        items,
        shipping_address,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_is_zero_padded() {
        assert_eq!(format_order_number(2025, 1), "PED-2025-000001");
        assert_eq!(format_order_number(2025, 123), "PED-2025-000123");
        assert_eq!(format_order_number(2026, 999_999), "PED-2026-999999");
    }
}
