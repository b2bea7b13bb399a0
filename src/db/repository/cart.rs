//! Cart Repository (collaborator contract)
//!
//! Checkout re-fetches the cart joined with live product rows and clears
//! it inside the order transaction. `add_item` exists for seeding carts.

use super::RepoResult;
use crate::db::models::CartLine;
use crate::utils::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

/// Add (or merge) a line item into the customer's cart
pub async fn add_item(
    pool: &SqlitePool,
    customer_id: i64,
    product_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let now = now_millis();
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO cart_item (id, customer_id, product_id, quantity, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT (customer_id, product_id) \
         DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(id)
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Cart lines joined with the live product (price, stock, name)
pub async fn find_lines(pool: &SqlitePool, customer_id: i64) -> RepoResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLine>(
        "SELECT p.id AS product_id, p.name AS product_name, p.price AS product_price, \
                p.stock AS product_stock, ci.quantity \
         FROM cart_item ci JOIN product p ON ci.product_id = p.id \
         WHERE ci.customer_id = ? ORDER BY ci.created_at",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Remove every line from the customer's cart
pub async fn clear(conn: &mut SqliteConnection, customer_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE customer_id = ?")
        .bind(customer_id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected())
}
